/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use log::debug;

use g3_load_types::MetricKey;

use super::{MetricSnapshot, RegistrySnapshot};
use crate::metrics::{Metric, Sample};
use crate::sink::Sink;

struct Submetric {
    key: MetricKey,
    sink: Sink,
}

impl Submetric {
    fn matches(&self, sample: &Sample) -> bool {
        self.key
            .selector()
            .map(|selector| sample.tags.contains_all(selector))
            .unwrap_or(false)
    }
}

struct MetricSinks {
    metric: Arc<Metric>,
    sink: Sink,
    submetrics: Vec<Submetric>,
}

impl MetricSinks {
    fn new(metric: Arc<Metric>, sink: Sink, selectors: &[MetricKey]) -> Self {
        let submetrics = selectors
            .iter()
            .filter(|key| key.is_submetric() && key.name() == metric.name())
            .map(|key| Submetric {
                key: key.clone(),
                sink: Sink::new(metric.metric_type()),
            })
            .collect();
        MetricSinks {
            metric,
            sink,
            submetrics,
        }
    }

    fn add(&mut self, sample: &Sample) {
        self.sink.add(sample);
        for sub in &mut self.submetrics {
            if sub.matches(sample) {
                sub.sink.add(sample);
            }
        }
    }
}

/// Every sink of a run, owned by the aggregator while it is running.
pub struct SinkTable {
    metrics: AHashMap<usize, MetricSinks>,
    selectors: Vec<MetricKey>,
}

impl SinkTable {
    pub fn new(sinks: Vec<(Arc<Metric>, Sink)>, selectors: Vec<MetricKey>) -> Self {
        let metrics = sinks
            .into_iter()
            .map(|(metric, sink)| {
                let id = metric.id();
                (id, MetricSinks::new(metric, sink, &selectors))
            })
            .collect();
        SinkTable { metrics, selectors }
    }

    pub fn add(&mut self, sample: &Sample) {
        let metric = &sample.metric;
        let sinks = self.metrics.entry(metric.id()).or_insert_with(|| {
            debug!("lazily allocate sink for metric {metric}");
            MetricSinks::new(
                metric.clone(),
                Sink::new(metric.metric_type()),
                &self.selectors,
            )
        });
        sinks.add(sample);
    }

    pub fn get(&self, key: &MetricKey) -> Option<&Sink> {
        let sinks = self
            .metrics
            .values()
            .find(|s| s.metric.name() == key.name())?;
        if key.is_submetric() {
            sinks
                .submetrics
                .iter()
                .find(|sub| sub.key == *key)
                .map(|sub| &sub.sink)
        } else {
            Some(&sinks.sink)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn snapshot(&mut self, elapsed: Duration) -> RegistrySnapshot {
        let mut entries = BTreeMap::new();
        for sinks in self.metrics.values_mut() {
            let metric = &sinks.metric;
            entries.insert(
                MetricKey::new(metric.name().clone()),
                MetricSnapshot {
                    metric: metric.clone(),
                    sink: sinks.sink.snapshot(),
                },
            );
            for sub in &mut sinks.submetrics {
                entries.insert(
                    sub.key.clone(),
                    MetricSnapshot {
                        metric: metric.clone(),
                        sink: sub.sink.snapshot(),
                    },
                );
            }
        }
        RegistrySnapshot::new(elapsed, entries)
    }
}
