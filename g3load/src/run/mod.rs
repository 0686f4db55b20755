/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use log::{debug, info, warn};
use slog::o;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use g3_load_types::MetricKey;

use crate::aggregate::{Aggregator, SinkTable};
use crate::config::{RunConfig, RunOptions, RunOverrides};
use crate::metrics::Registry;
use crate::pipeline::SamplePipeline;
use crate::script::{ScriptError, VuContext, VuOptions, VuState};
use crate::threshold::{ThresholdEvaluator, ThresholdSet};

mod error;
pub use error::{RunError, RunErrorKind};

mod control;
pub use control::{AbortReason, RunControl, RunPhase};

mod outcome;
pub use outcome::RunOutcome;

mod vu;
use vu::{IterationBudget, IterationStats, Vu, VuScript};

/// A prepared run, all metrics are declared and all thresholds are valid.
pub struct Run {
    options: RunOptions,
    thresholds: ThresholdSet,
    selectors: Vec<MetricKey>,
    registry: Registry,
    scripts: Vec<VuScript>,
    control: RunControl,
    logger: slog::Logger,
    phase: RunPhase,
}

impl Run {
    /// Validate the config and run the init phase of every VU.
    ///
    /// Thresholds are checked before anything else, so a malformed one
    /// fails the run before any sample could be emitted.
    pub fn prepare(config: RunConfig, overrides: &RunOverrides) -> anyhow::Result<Self> {
        let RunConfig {
            mut options,
            metrics,
            thresholds,
            abort,
        } = config;
        overrides
            .apply(&mut options)
            .map_err(RunError::invalid_config)?;
        let thresholds = ThresholdSet::validate(&thresholds, options.no_thresholds)?;

        let mut registry = Registry::new();
        let mut scripts = Vec::with_capacity(options.vus);
        for id in 0..options.vus {
            let mut ctx = VuContext::for_init(registry);
            let script = VuScript::init(&mut ctx, &metrics, abort.as_ref());
            registry = ctx
                .exit_init()
                .ok_or_else(|| anyhow!("registry lost in the init context of VU #{id}"))?;
            let script = script.map_err(|e| {
                let kind = match e {
                    ScriptError::Aborted(_) => RunErrorKind::ScriptAborted,
                    _ => RunErrorKind::ScriptException,
                };
                let e = anyhow::Error::new(e).context(format!("init of VU #{id} failed"));
                RunError::new(kind, e)
            })?;
            scripts.push(script);
        }

        let selectors = thresholds.bind(&registry)?;
        debug!(
            "run prepared with {} metrics, {} thresholds and {} submetrics",
            registry.len(),
            thresholds.len(),
            selectors.len()
        );

        Ok(Run {
            options,
            thresholds,
            selectors,
            registry,
            scripts,
            control: RunControl::new(),
            logger: slog_scope::logger(),
            phase: RunPhase::Init,
        })
    }

    /// Set the parent logger of the VU loggers.
    pub fn set_logger(&mut self, logger: slog::Logger) {
        self.logger = logger;
    }

    #[inline]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    #[inline]
    pub fn control(&self) -> &RunControl {
        &self.control
    }

    #[inline]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub async fn execute(self) -> anyhow::Result<RunOutcome> {
        let Run {
            options,
            thresholds,
            selectors,
            mut registry,
            scripts,
            control,
            logger,
            mut phase,
        } = self;

        let started = Instant::now();
        enter(&mut phase, RunPhase::Running);

        let (sender, receiver) = SamplePipeline::bounded(options.pipeline_capacity);
        let table = SinkTable::new(registry.take_sinks(), selectors);
        let (aggregator, aggregator_handle) = Aggregator::new(table, receiver, started);
        let aggregator_cancel = CancellationToken::new();
        let aggregator_task = tokio::spawn(aggregator.into_running(aggregator_cancel.clone()));

        let evaluator = ThresholdEvaluator::new(
            thresholds,
            aggregator_handle,
            control.clone(),
            options.evaluation_interval,
            started,
        );
        let evaluator_task = tokio::spawn(evaluator.into_running());

        if !options.duration.is_zero() {
            let control = control.clone();
            let duration = options.duration;
            tokio::spawn(async move {
                tokio::select! {
                    _ = control.cancelled() => {}
                    _ = tokio::time::sleep_until(started + duration) => {
                        debug!("run duration {duration:?} reached");
                        control.stop();
                    }
                }
            });
        }

        let budget = Arc::new(IterationBudget::new(options.iterations));
        let run_tags = Arc::new(options.tags.clone());
        let mut vus = JoinSet::new();
        for (id, script) in scripts.into_iter().enumerate() {
            let state = VuState {
                options: VuOptions {
                    throw: options.throw,
                },
                sender: sender.clone(),
                tags: run_tags.clone(),
                logger: logger.new(o!("vu" => id)),
            };
            let vu = Vu::new(
                id,
                script,
                VuContext::for_vu(state),
                budget.clone(),
                control.clone(),
                options.iteration_pause,
            );
            vus.spawn(vu.into_running());
        }
        drop(sender);
        info!("run started with {} VUs", vus.len());

        let stats = join_vus(&mut vus, &control, options.grace_stop, &mut phase).await;

        enter(&mut phase, RunPhase::Stopping);
        control.stop();
        let mut thresholds = evaluator_task
            .await
            .context("threshold evaluator task failed")?;
        aggregator_cancel.cancel();
        let mut table = aggregator_task.await.context("aggregator task failed")?;

        let duration = started.elapsed();
        let snapshot = table.snapshot(duration);
        let evaluation = thresholds.evaluate(&snapshot, duration);
        debug!(
            "final threshold evaluation: {} passed, {} failed, {} skipped",
            evaluation.passed, evaluation.failed, evaluation.skipped
        );
        enter(&mut phase, RunPhase::Finished);

        Ok(RunOutcome {
            duration,
            iterations: stats.completed,
            interrupted: stats.interrupted,
            aborted: control.abort_reason(),
            thresholds,
            snapshot,
        })
    }
}

/// Wait for all VUs and sum up their iterations.
///
/// VUs still running `grace_stop` after the run is cancelled get aborted.
async fn join_vus(
    vus: &mut JoinSet<Result<IterationStats, ScriptError>>,
    control: &RunControl,
    grace_stop: Duration,
    phase: &mut RunPhase,
) -> IterationStats {
    let mut stats = IterationStats::default();
    let mut stop_deadline = None;
    loop {
        let joined = match stop_deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, vus.join_next()).await {
                Ok(r) => r,
                Err(_) => {
                    warn!("{} VUs have not stopped within {grace_stop:?}", vus.len());
                    vus.abort_all();
                    while vus.join_next().await.is_some() {}
                    break;
                }
            },
            None => tokio::select! {
                biased;

                r = vus.join_next() => r,
                _ = control.cancelled() => {
                    enter(phase, RunPhase::Stopping);
                    stop_deadline = Some(Instant::now() + grace_stop);
                    continue;
                }
            },
        };

        let Some(r) = joined else {
            break;
        };
        match r {
            Ok(Ok(s)) => stats += s,
            Ok(Err(e)) => {
                warn!("script exception: {e}");
                control.abort(AbortReason::ScriptException(e.to_string()));
            }
            Err(e) => warn!("VU task failed: {e}"),
        }
    }
    stats
}

fn enter(phase: &mut RunPhase, next: RunPhase) {
    if *phase != next {
        debug!("run phase {phase:?} -> {next:?}");
        *phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(n: usize) -> IterationStats {
        IterationStats {
            completed: n,
            interrupted: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn grace_stop_aborts_stuck_vus() {
        let control = RunControl::new();
        let mut vus = JoinSet::new();
        vus.spawn(async { Ok(completed(2)) });
        vus.spawn(async {
            // never looks at the cancellation token
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(completed(100))
        });

        let stopper = control.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.stop();
        });

        let started = Instant::now();
        let mut phase = RunPhase::Running;
        let stats = join_vus(&mut vus, &control, Duration::from_secs(5), &mut phase).await;
        assert_eq!(stats, completed(2));
        assert_eq!(phase, RunPhase::Stopping);
        assert!(vus.is_empty());
        assert!(control.abort_reason().is_none());

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn vu_error_aborts_run() {
        let control = RunControl::new();
        let mut vus = JoinSet::new();
        vus.spawn(async { Err(ScriptError::NoVuState) });
        vus.spawn(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(completed(3))
        });

        let mut phase = RunPhase::Running;
        let stats = join_vus(&mut vus, &control, Duration::from_secs(30), &mut phase).await;
        assert_eq!(stats, completed(3));
        assert!(matches!(
            control.abort_reason().as_deref(),
            Some(AbortReason::ScriptException(_))
        ));
    }
}
