/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use g3_load_types::{MetricName, MetricType, ValueType};

/// A declared metric. Immutable once created by the [`Registry`](super::Registry).
#[derive(Debug, PartialEq, Eq)]
pub struct Metric {
    id: usize,
    name: MetricName,
    metric_type: MetricType,
    value_type: ValueType,
}

impl Metric {
    pub(super) fn new(
        id: usize,
        name: MetricName,
        metric_type: MetricType,
        value_type: ValueType,
    ) -> Self {
        Metric {
            id,
            name,
            metric_type,
            value_type,
        }
    }

    /// Index of the metric inside its registry.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    #[inline]
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub(super) fn same_kind(&self, metric_type: MetricType, value_type: ValueType) -> bool {
        self.metric_type == metric_type && self.value_type == value_type
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.name, self.metric_type)?;
        if self.value_type == ValueType::Time {
            f.write_str(",time")?;
        }
        f.write_str(")")
    }
}
