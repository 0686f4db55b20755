/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use log::{debug, warn};

use g3_load_types::MetricKey;
use g3_threshold::Threshold;

use crate::aggregate::RegistrySnapshot;
use crate::config::ThresholdConfig;
use crate::metrics::Registry;
use crate::run::RunError;

#[derive(Debug)]
pub struct ThresholdState {
    threshold: Threshold,
    evaluated: bool,
    last_failed: bool,
    ever_failed: bool,
}

impl ThresholdState {
    fn new(threshold: Threshold) -> Self {
        ThresholdState {
            threshold,
            evaluated: false,
            last_failed: false,
            ever_failed: false,
        }
    }

    #[inline]
    pub fn threshold(&self) -> &Threshold {
        &self.threshold
    }

    /// Whether the threshold has been evaluated at least once.
    #[inline]
    pub fn evaluated(&self) -> bool {
        self.evaluated
    }

    #[inline]
    pub fn last_failed(&self) -> bool {
        self.last_failed
    }

    #[inline]
    pub fn ever_failed(&self) -> bool {
        self.ever_failed
    }
}

#[derive(Debug)]
pub struct MetricThresholds {
    key: MetricKey,
    thresholds: Vec<ThresholdState>,
}

impl MetricThresholds {
    #[inline]
    pub fn key(&self) -> &MetricKey {
        &self.key
    }

    #[inline]
    pub fn thresholds(&self) -> &[ThresholdState] {
        &self.thresholds
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbortRequest {
    pub key: MetricKey,
    pub threshold: String,
}

/// Result of one evaluation pass.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub abort: Option<AbortRequest>,
}

impl Evaluation {
    #[inline]
    pub fn is_passing(&self) -> bool {
        self.failed == 0
    }
}

/// All thresholds of a run, grouped by metric key.
#[derive(Debug, Default)]
pub struct ThresholdSet {
    metrics: Vec<MetricThresholds>,
}

impl ThresholdSet {
    /// Parse all configured thresholds.
    ///
    /// Nothing is parsed if thresholds are disabled.
    pub fn validate(configs: &[ThresholdConfig], no_thresholds: bool) -> Result<Self, RunError> {
        if no_thresholds {
            if !configs.is_empty() {
                debug!("thresholds are disabled, {} entries ignored", configs.len());
            }
            return Ok(ThresholdSet::default());
        }

        let mut metrics: Vec<MetricThresholds> = Vec::with_capacity(configs.len());
        for config in configs {
            let key = MetricKey::from_str(&config.key).map_err(|e| {
                RunError::invalid_config(anyhow!(
                    "invalid threshold metric key '{}': {e}",
                    config.key
                ))
            })?;

            let mut thresholds = Vec::with_capacity(config.entries.len());
            for entry in &config.entries {
                let threshold = Threshold::parse(&entry.source).map_err(|e| {
                    RunError::invalid_config(anyhow!(
                        "invalid threshold '{}' for metric '{}': {e}",
                        entry.source,
                        config.key
                    ))
                })?;
                let threshold = threshold.with_abort(entry.abort_on_fail, entry.delay_abort_eval);
                thresholds.push(ThresholdState::new(threshold));
            }

            if let Some(m) = metrics
                .iter_mut()
                .find(|m| m.key == key)
            {
                m.thresholds.extend(thresholds);
            } else {
                metrics.push(MetricThresholds { key, thresholds });
            }
        }
        Ok(ThresholdSet { metrics })
    }

    /// Check the thresholds against the declared metrics.
    ///
    /// Returns the submetric selectors that need their own sinks.
    pub fn bind(&self, registry: &Registry) -> Result<Vec<MetricKey>, RunError> {
        let mut selectors = Vec::new();
        for m in &self.metrics {
            let Some(metric) = registry.get(m.key.name().as_str()) else {
                return Err(RunError::invalid_config(anyhow!(
                    "threshold defined on metric '{}' which is not declared",
                    m.key.name()
                )));
            };

            for state in &m.thresholds {
                state
                    .threshold
                    .check_metric_type(metric.metric_type())
                    .map_err(|e| {
                        RunError::invalid_config(anyhow!(
                            "invalid threshold '{}' for metric '{}': {e}",
                            state.threshold.source(),
                            m.key
                        ))
                    })?;
            }

            if m.key.is_submetric() && !selectors.contains(&m.key) {
                selectors.push(m.key.clone());
            }
        }
        Ok(selectors)
    }

    /// Number of thresholds.
    pub fn len(&self) -> usize {
        self.metrics.iter().map(|m| m.thresholds.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricThresholds> {
        self.metrics.iter()
    }

    /// Whether any threshold failed at its last evaluation.
    pub fn has_failed(&self) -> bool {
        self.metrics
            .iter()
            .flat_map(|m| m.thresholds.iter())
            .any(|t| t.last_failed)
    }

    /// Evaluate every threshold against the snapshot.
    ///
    /// Metrics without any sample yet are skipped. At most one abort request
    /// is returned, for the first failing threshold whose grace period is over.
    pub fn evaluate(&mut self, snapshot: &RegistrySnapshot, elapsed: Duration) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for m in &mut self.metrics {
            let entry = match snapshot.get(&m.key) {
                Some(entry) if !entry.sink.is_empty() => entry,
                _ => {
                    evaluation.skipped += m.thresholds.len();
                    continue;
                }
            };
            let view = entry.view(snapshot.elapsed());

            for state in &mut m.thresholds {
                let passed = match state.threshold.run(&view) {
                    Ok(passed) => passed,
                    Err(e) => {
                        warn!(
                            "unable to evaluate threshold '{}' of metric '{}': {e}",
                            state.threshold.source(),
                            m.key
                        );
                        evaluation.skipped += 1;
                        continue;
                    }
                };

                state.evaluated = true;
                state.last_failed = !passed;
                if passed {
                    evaluation.passed += 1;
                    continue;
                }

                state.ever_failed = true;
                evaluation.failed += 1;
                if evaluation.abort.is_none() && state.threshold.abort_due(elapsed) {
                    evaluation.abort = Some(AbortRequest {
                        key: m.key.clone(),
                        threshold: state.threshold.source().to_string(),
                    });
                }
            }
        }

        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use g3_load_types::{MetricTagName, MetricTagSet, MetricTagValue, MetricType, ValueType};

    use crate::aggregate::SinkTable;
    use crate::config::ThresholdEntry;
    use crate::metrics::Sample;
    use crate::run::RunErrorKind;

    fn config(key: &str, entries: &[&str]) -> ThresholdConfig {
        let entries = entries.iter().map(|s| ThresholdEntry::from(*s)).collect();
        ThresholdConfig::new(key, entries)
    }

    fn aborting(key: &str, source: &str, grace: Duration) -> ThresholdConfig {
        let entry = ThresholdEntry {
            source: source.to_string(),
            abort_on_fail: true,
            delay_abort_eval: grace,
        };
        ThresholdConfig::new(key, vec![entry])
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .get_or_new("http_req_duration", MetricType::Trend, ValueType::Time)
            .unwrap();
        registry
            .get_or_new("checks", MetricType::Rate, ValueType::Default)
            .unwrap();
        registry
    }

    fn status(code: &str) -> Arc<MetricTagSet> {
        let name = MetricTagName::from_str("status").unwrap();
        Arc::new(MetricTagSet::new().with_tag(name, MetricTagValue::from(code)))
    }

    fn table(registry: &mut Registry, selectors: Vec<MetricKey>) -> SinkTable {
        let duration = registry.get("http_req_duration").unwrap().clone();
        let mut table = SinkTable::new(registry.take_sinks(), selectors);
        for v in 1..=100 {
            let code = if v <= 90 { "200" } else { "500" };
            table.add(&Sample::new(duration.clone(), v as f64, status(code)));
        }
        table
    }

    #[test]
    fn validate_ok() {
        let set = ThresholdSet::validate(
            &[
                config("http_req_duration", &["p(95)<200", "avg<100 && max<1000"]),
                config("checks", &["rate>0.9"]),
            ],
            false,
        )
        .unwrap();
        assert_eq!(set.len(), 3);
        assert!(!set.has_failed());
        let keys: Vec<String> = set.iter().map(|m| m.key().to_string()).collect();
        assert_eq!(keys, vec!["http_req_duration", "checks"]);
    }

    #[test]
    fn validate_malformed() {
        let e = ThresholdSet::validate(&[config("checks", &["rate>0.9", "rate!0.9"])], false)
            .unwrap_err();
        assert_eq!(e.kind(), RunErrorKind::InvalidConfig);
        let msg = format!("{:#}", anyhow::Error::from(e));
        assert!(msg.contains("rate!0.9"));
        assert!(msg.contains("checks"));

        let e = ThresholdSet::validate(&[config("checks{", &["rate>0.9"])], false).unwrap_err();
        assert_eq!(e.kind(), RunErrorKind::InvalidConfig);
    }

    #[test]
    fn validate_disabled() {
        let set = ThresholdSet::validate(&[config("checks", &["rate!0.9"])], true).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn bind() {
        let registry = registry();
        let set = ThresholdSet::validate(
            &[
                config("http_req_duration", &["p(95)<200"]),
                config("http_req_duration{status:200}", &["max<100"]),
            ],
            false,
        )
        .unwrap();
        let selectors = set.bind(&registry).unwrap();
        assert_eq!(
            selectors,
            vec![MetricKey::from_str("http_req_duration{status:200}").unwrap()]
        );

        let set = ThresholdSet::validate(&[config("iterations", &["count>1"])], false).unwrap();
        let e = set.bind(&registry).unwrap_err();
        assert_eq!(e.kind(), RunErrorKind::InvalidConfig);

        let set = ThresholdSet::validate(&[config("http_req_duration", &["value<3"])], false)
            .unwrap();
        let e = set.bind(&registry).unwrap_err();
        assert_eq!(e.kind(), RunErrorKind::InvalidConfig);
    }

    #[test]
    fn evaluate() {
        let mut registry = registry();
        let mut set = ThresholdSet::validate(
            &[
                config("http_req_duration", &["med==50.5", "p(95)<90"]),
                config("http_req_duration{status:200}", &["max<=90"]),
                config("checks", &["rate>0.9"]),
            ],
            false,
        )
        .unwrap();
        let selectors = set.bind(&registry).unwrap();
        let mut table = table(&mut registry, selectors);
        let snapshot = table.snapshot(Duration::from_secs(1));

        let evaluation = set.evaluate(&snapshot, Duration::from_secs(1));
        assert_eq!(evaluation.passed, 2);
        assert_eq!(evaluation.failed, 1);
        assert_eq!(evaluation.skipped, 1);
        assert!(evaluation.abort.is_none());
        assert!(!evaluation.is_passing());
        assert!(set.has_failed());

        let states: Vec<(bool, bool)> = set
            .iter()
            .flat_map(|m| m.thresholds())
            .map(|t| (t.evaluated(), t.last_failed()))
            .collect();
        assert_eq!(
            states,
            vec![(true, false), (true, true), (true, false), (false, false)]
        );
    }

    #[test]
    fn abort_after_grace() {
        let mut registry = registry();
        let mut set = ThresholdSet::validate(
            &[aborting("http_req_duration", "p(95)<90", Duration::from_secs(5))],
            false,
        )
        .unwrap();
        let selectors = set.bind(&registry).unwrap();
        let mut table = table(&mut registry, selectors);

        let snapshot = table.snapshot(Duration::from_secs(4));
        let evaluation = set.evaluate(&snapshot, Duration::from_secs(4));
        assert_eq!(evaluation.failed, 1);
        assert!(evaluation.abort.is_none());

        let snapshot = table.snapshot(Duration::from_secs(5));
        let evaluation = set.evaluate(&snapshot, Duration::from_secs(5));
        assert_eq!(
            evaluation.abort,
            Some(AbortRequest {
                key: MetricKey::from_str("http_req_duration").unwrap(),
                threshold: "p(95)<90".to_string(),
            })
        );
    }

    #[test]
    fn recover_from_failure() {
        let mut registry = registry();
        let checks = registry.get("checks").unwrap().clone();
        let mut set = ThresholdSet::validate(&[config("checks", &["rate>=0.5"])], false).unwrap();
        let selectors = set.bind(&registry).unwrap();
        let mut table = SinkTable::new(registry.take_sinks(), selectors);
        let tags = Arc::new(MetricTagSet::new());

        table.add(&Sample::new(checks.clone(), 0.0, tags.clone()));
        let snapshot = table.snapshot(Duration::from_secs(1));
        set.evaluate(&snapshot, Duration::from_secs(1));
        assert!(set.has_failed());

        table.add(&Sample::new(checks, 1.0, tags));
        let snapshot = table.snapshot(Duration::from_secs(2));
        set.evaluate(&snapshot, Duration::from_secs(2));
        assert!(!set.has_failed());

        let state = &set.iter().next().unwrap().thresholds()[0];
        assert!(state.ever_failed());
        assert!(!state.last_failed());
    }
}
