/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use g3_load_types::MetricKey;

use crate::metrics::Metric;
use crate::sink::{SinkSnapshot, SinkView};

#[derive(Clone, Debug)]
pub struct MetricSnapshot {
    pub metric: Arc<Metric>,
    pub sink: SinkSnapshot,
}

impl MetricSnapshot {
    pub fn view(&self, elapsed: Duration) -> SinkView<'_> {
        self.sink.view(self.metric.value_type(), elapsed)
    }
}

/// Point in time copy of every metric and submetric sink.
#[derive(Clone, Debug)]
pub struct RegistrySnapshot {
    elapsed: Duration,
    entries: BTreeMap<MetricKey, MetricSnapshot>,
}

impl RegistrySnapshot {
    pub(super) fn new(elapsed: Duration, entries: BTreeMap<MetricKey, MetricSnapshot>) -> Self {
        RegistrySnapshot {
            elapsed,
            entries,
        }
    }

    /// Run time when the snapshot was taken.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn get(&self, key: &MetricKey) -> Option<&MetricSnapshot> {
        self.entries.get(key)
    }

    /// Entries ordered by key, submetrics right after their parent metric.
    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &MetricSnapshot)> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
