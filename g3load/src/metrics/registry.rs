/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use thiserror::Error;

use g3_load_types::{MetricName, MetricType, ParseError, ValueType};

use super::Metric;
use crate::sink::Sink;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid metric name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: ParseError,
    },
    #[error(
        "metric {name} already exists as {existing_type}/{existing_value}, \
         can not redefine it as {requested_type}/{requested_value}"
    )]
    ConflictingMetricDefinition {
        name: MetricName,
        existing_type: MetricType,
        existing_value: ValueType,
        requested_type: MetricType,
        requested_value: ValueType,
    },
}

/// All metrics declared in one run, and the sinks allocated for them.
///
/// Sinks stay here until the aggregator takes them with [`Registry::take_sinks`].
#[derive(Default)]
pub struct Registry {
    by_name: AHashMap<MetricName, Arc<Metric>>,
    metrics: Vec<Arc<Metric>>,
    sinks: Vec<Option<Sink>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Create a metric, or get the existing one if it has the same definition.
    pub fn get_or_new(
        &mut self,
        name: &str,
        metric_type: MetricType,
        value_type: ValueType,
    ) -> Result<Arc<Metric>, RegistryError> {
        if let Some(metric) = self.by_name.get(name) {
            return if metric.same_kind(metric_type, value_type) {
                Ok(metric.clone())
            } else {
                Err(RegistryError::ConflictingMetricDefinition {
                    name: metric.name().clone(),
                    existing_type: metric.metric_type(),
                    existing_value: metric.value_type(),
                    requested_type: metric_type,
                    requested_value: value_type,
                })
            };
        }

        let name = MetricName::from_str(name).map_err(|source| RegistryError::InvalidName {
            name: name.to_string(),
            source,
        })?;
        let metric = Arc::new(Metric::new(
            self.metrics.len(),
            name.clone(),
            metric_type,
            value_type,
        ));
        debug!("new metric {metric}");
        self.by_name.insert(name, metric.clone());
        self.metrics.push(metric.clone());
        self.sinks.push(Some(Sink::new(metric_type)));
        Ok(metric)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Metric>> {
        self.by_name.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// All metrics in declaration order.
    #[inline]
    pub fn metrics(&self) -> &[Arc<Metric>] {
        &self.metrics
    }

    /// Hand the allocated sinks over to their single writer.
    ///
    /// Sinks already taken are not returned again.
    pub fn take_sinks(&mut self) -> Vec<(Arc<Metric>, Sink)> {
        self.metrics
            .iter()
            .zip(self.sinks.iter_mut())
            .filter_map(|(m, s)| s.take().map(|s| (m.clone(), s)))
            .collect()
    }
}
