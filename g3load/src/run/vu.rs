/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::debug;

use super::{AbortReason, RunControl};
use crate::config::{AbortConfig, AbortPoint, MetricConfig, ValueGenerator};
use crate::script::{
    ExecutionModule, MetricHandle, MetricsModule, ScriptError, ScriptObject, ScriptValue,
    VuContext,
};

/// Iterations shared by all VUs of a run.
pub(super) struct IterationBudget {
    limited: bool,
    left: AtomicUsize,
    next_id: AtomicUsize,
}

impl IterationBudget {
    pub(super) fn new(total: Option<usize>) -> Self {
        IterationBudget {
            limited: total.is_some(),
            left: AtomicUsize::new(total.unwrap_or_default()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Take one iteration, returns its id or `None` if the budget is used up.
    pub(super) fn fetch(&self) -> Option<usize> {
        if self.limited {
            let mut curr = self.left.load(Ordering::Acquire);
            loop {
                if curr == 0 {
                    return None;
                }

                match self.left.compare_exchange(
                    curr,
                    curr - 1,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => break,
                    Err(actual) => curr = actual,
                }
            }
        }

        Some(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

struct ValueSource {
    generator: ValueGenerator,
    next_index: usize,
}

impl ValueSource {
    fn new(generator: ValueGenerator) -> Self {
        ValueSource {
            generator,
            next_index: 0,
        }
    }

    fn next_value(&mut self, rng: &mut fastrand::Rng) -> ScriptValue {
        match &self.generator {
            ValueGenerator::Constant(v) => v.clone(),
            ValueGenerator::Uniform { low, high } => {
                ScriptValue::Number(low + rng.f64() * (high - low))
            }
            ValueGenerator::Ratio(p) => ScriptValue::Bool(rng.f64() < *p),
            ValueGenerator::Sequence(values) => {
                if values.is_empty() {
                    return ScriptValue::Undefined;
                }
                let v = values[self.next_index % values.len()].clone();
                self.next_index = self.next_index.wrapping_add(1);
                v
            }
        }
    }
}

struct VuMetric {
    handle: MetricHandle,
    tags: ScriptObject,
    source: ValueSource,
}

/// The metrics a VU emits on each iteration.
pub(super) struct VuScript {
    metrics: Vec<VuMetric>,
    abort_at: Option<usize>,
    abort_reason: Option<String>,
}

impl VuScript {
    /// Declare every configured metric, this must be called in the init context.
    pub(super) fn init(
        ctx: &mut VuContext,
        configs: &[MetricConfig],
        abort: Option<&AbortConfig>,
    ) -> Result<Self, ScriptError> {
        let mut metrics = Vec::with_capacity(configs.len());
        for config in configs {
            let handle =
                MetricsModule::declare(ctx, &config.name, config.metric_type, config.is_time)?;
            metrics.push(VuMetric {
                handle,
                tags: config.tags.clone(),
                source: ValueSource::new(config.generator.clone()),
            });
        }

        let mut script = VuScript {
            metrics,
            abort_at: None,
            abort_reason: None,
        };
        if let Some(abort) = abort {
            match abort.point {
                AbortPoint::Init => {
                    return Err(ExecutionModule::abort(ctx, abort.reason.as_deref()));
                }
                AbortPoint::Iteration(id) => {
                    script.abort_at = Some(id);
                    script.abort_reason = abort.reason.clone();
                }
            }
        }
        Ok(script)
    }
}

/// Iterations run by one VU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct IterationStats {
    pub(super) completed: usize,
    pub(super) interrupted: usize,
}

impl std::ops::AddAssign for IterationStats {
    fn add_assign(&mut self, other: Self) {
        self.completed += other.completed;
        self.interrupted += other.interrupted;
    }
}

pub(super) struct Vu {
    id: usize,
    script: VuScript,
    ctx: VuContext,
    rng: fastrand::Rng,
    budget: Arc<IterationBudget>,
    control: RunControl,
    pause: Duration,
}

impl Vu {
    pub(super) fn new(
        id: usize,
        script: VuScript,
        ctx: VuContext,
        budget: Arc<IterationBudget>,
        control: RunControl,
        pause: Duration,
    ) -> Self {
        Vu {
            id,
            script,
            ctx,
            rng: fastrand::Rng::new(),
            budget,
            control,
            pause,
        }
    }

    /// Iterate until the run is stopped or the iteration budget is used up.
    ///
    /// An iteration taken from the budget is either completed or counted
    /// as interrupted.
    pub(super) async fn into_running(mut self) -> Result<IterationStats, ScriptError> {
        let mut stats = IterationStats::default();

        while !self.control.is_cancelled() {
            let Some(iteration) = self.budget.fetch() else {
                debug!("VU #{} has no iteration left", self.id);
                break;
            };

            match self.iterate(iteration).await {
                Ok(true) => stats.completed += 1,
                Ok(false) => {
                    debug!("VU #{} interrupted at iteration {iteration}", self.id);
                    stats.interrupted += 1;
                    break;
                }
                Err(ScriptError::Pipeline(e)) => {
                    debug!("VU #{} stopped at iteration {iteration}: {e}", self.id);
                    stats.interrupted += 1;
                    break;
                }
                Err(ScriptError::Aborted(message)) => {
                    stats.interrupted += 1;
                    self.control.abort(AbortReason::ScriptAbort(message));
                    break;
                }
                Err(e) => return Err(e),
            }

            if !self.pause.is_zero() {
                tokio::select! {
                    biased;

                    _ = self.control.cancelled() => break,
                    _ = tokio::time::sleep(self.pause) => {}
                }
            }
        }

        debug!(
            "VU #{} finished after {} iterations, {} interrupted",
            self.id, stats.completed, stats.interrupted
        );
        Ok(stats)
    }

    /// Emit one sample per metric, returns false if cancelled in between.
    async fn iterate(&mut self, iteration: usize) -> Result<bool, ScriptError> {
        if self.script.abort_at == Some(iteration) {
            let reason = self.script.abort_reason.as_deref();
            return Err(ExecutionModule::abort(&self.ctx, reason));
        }

        for m in &mut self.script.metrics {
            if self.control.is_cancelled() {
                return Ok(false);
            }
            let value = m.source.next_value(&mut self.rng);
            m.handle.add(&self.ctx, Some(&value), Some(&m.tags)).await?;
        }
        Ok(true)
    }
}
