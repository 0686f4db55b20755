/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use log::{debug, trace};
use tokio::time::{Instant, MissedTickBehavior};

use super::ThresholdSet;
use crate::aggregate::AggregatorHandle;
use crate::run::{AbortReason, RunControl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Evaluating,
    Passing,
    Failing,
    Aborting,
}

/// Periodic threshold evaluation of a running test.
pub struct ThresholdEvaluator {
    thresholds: ThresholdSet,
    aggregator: AggregatorHandle,
    control: RunControl,
    interval: Duration,
    started: Instant,
    state: EvaluatorState,
}

impl ThresholdEvaluator {
    pub fn new(
        thresholds: ThresholdSet,
        aggregator: AggregatorHandle,
        control: RunControl,
        interval: Duration,
        started: Instant,
    ) -> Self {
        ThresholdEvaluator {
            thresholds,
            aggregator,
            control,
            interval,
            started,
            state: EvaluatorState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    /// Evaluate on every interval until the run is cancelled.
    ///
    /// An abort is only requested through the run control, the caller is
    /// responsible to stop everything else.
    pub async fn into_running(mut self) -> ThresholdSet {
        if self.thresholds.is_empty() {
            debug!("no threshold to evaluate");
            return self.thresholds;
        }

        let mut interval =
            tokio::time::interval_at(self.started + self.interval, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.control.cancelled() => break,
                _ = interval.tick() => {
                    if !self.tick().await {
                        break;
                    }
                }
            }
        }

        self.set_state(EvaluatorState::Idle);
        self.thresholds
    }

    /// Run one evaluation, returns false if evaluation should stop.
    async fn tick(&mut self) -> bool {
        self.set_state(EvaluatorState::Evaluating);
        let Some(snapshot) = self.aggregator.snapshot().await else {
            debug!("aggregator has stopped, stop threshold evaluation");
            return false;
        };

        let elapsed = snapshot.elapsed();
        let evaluation = self.thresholds.evaluate(&snapshot, elapsed);
        trace!(
            "threshold evaluation at {elapsed:?}: {} passed, {} failed, {} skipped",
            evaluation.passed,
            evaluation.failed,
            evaluation.skipped
        );

        if let Some(request) = evaluation.abort {
            self.set_state(EvaluatorState::Aborting);
            self.control.abort(AbortReason::ThresholdBreached {
                key: request.key,
                threshold: request.threshold,
            });
            return false;
        }

        if evaluation.is_passing() {
            self.set_state(EvaluatorState::Passing);
        } else {
            self.set_state(EvaluatorState::Failing);
        }
        true
    }

    fn set_state(&mut self, state: EvaluatorState) {
        if self.state != state {
            trace!("threshold evaluator state {:?} -> {state:?}", self.state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use g3_load_types::{MetricTagSet, MetricType, ValueType};
    use tokio_util::sync::CancellationToken;

    use crate::aggregate::{Aggregator, SinkTable};
    use crate::config::{ThresholdConfig, ThresholdEntry};
    use crate::metrics::{Registry, Sample};
    use crate::pipeline::{SamplePipeline, SampleSender};

    struct Setup {
        evaluator: ThresholdEvaluator,
        sender: SampleSender,
        metric: Arc<crate::metrics::Metric>,
        control: RunControl,
        cancel: CancellationToken,
    }

    fn setup(entry: ThresholdEntry) -> Setup {
        let mut registry = Registry::new();
        let metric = registry
            .get_or_new("checks", MetricType::Rate, ValueType::Default)
            .unwrap();
        let thresholds =
            ThresholdSet::validate(&[ThresholdConfig::new("checks", vec![entry])], false)
                .unwrap();
        let selectors = thresholds.bind(&registry).unwrap();

        let started = Instant::now();
        let (sender, receiver) = SamplePipeline::bounded(16);
        let table = SinkTable::new(registry.take_sinks(), selectors);
        let (aggregator, handle) = Aggregator::new(table, receiver, started);
        let cancel = CancellationToken::new();
        tokio::spawn(aggregator.into_running(cancel.clone()));

        let control = RunControl::new();
        let evaluator = ThresholdEvaluator::new(
            thresholds,
            handle,
            control.clone(),
            Duration::from_secs(1),
            started,
        );
        Setup {
            evaluator,
            sender,
            metric,
            control,
            cancel,
        }
    }

    async fn push(setup: &Setup, value: f64) {
        let sample = Sample::new(setup.metric.clone(), value, Arc::new(MetricTagSet::new()));
        setup.sender.push(sample.into()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn abort_after_grace_period() {
        let entry = ThresholdEntry {
            source: "rate>0.5".to_string(),
            abort_on_fail: true,
            delay_abort_eval: Duration::from_secs(5),
        };
        let setup = setup(entry);
        push(&setup, 0.0).await;

        let started = Instant::now();
        let control = setup.control.clone();
        let task = tokio::spawn(setup.evaluator.into_running());
        control.cancelled().await;
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(7));

        let reason = control.abort_reason().unwrap();
        assert!(matches!(
            reason.as_ref(),
            AbortReason::ThresholdBreached { threshold, .. } if threshold == "rate>0.5"
        ));
        let thresholds = task.await.unwrap();
        assert!(thresholds.has_failed());
        setup.cancel.cancel();
        drop(setup.sender);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_without_abort() {
        let setup = setup(ThresholdEntry::from("rate>0.5"));
        push(&setup, 0.0).await;

        let control = setup.control.clone();
        let task = tokio::spawn(setup.evaluator.into_running());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!control.is_cancelled());

        control.stop();
        let thresholds = task.await.unwrap();
        assert!(thresholds.has_failed());
        assert!(control.abort_reason().is_none());
        setup.cancel.cancel();
        drop(setup.sender);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_states() {
        let mut setup = setup(ThresholdEntry::from("rate>0.5"));
        assert_eq!(setup.evaluator.state(), EvaluatorState::Idle);

        push(&setup, 1.0).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(setup.evaluator.tick().await);
        assert_eq!(setup.evaluator.state(), EvaluatorState::Passing);

        push(&setup, 0.0).await;
        push(&setup, 0.0).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(setup.evaluator.tick().await);
        assert_eq!(setup.evaluator.state(), EvaluatorState::Failing);

        setup.cancel.cancel();
        drop(setup.sender);
    }
}
