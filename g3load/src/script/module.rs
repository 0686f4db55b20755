/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use g3_load_types::{
    MetricName, MetricTagName, MetricTagSet, MetricTagValue, MetricType, ValueType,
};

use super::{ScriptError, ScriptObject, ScriptValue, VuContext, VuState};
use crate::metrics::{Metric, Sample};

/// Constructors of the four metric types.
pub struct MetricsModule;

impl MetricsModule {
    pub fn counter(
        ctx: &mut VuContext,
        name: &str,
        is_time: bool,
    ) -> Result<MetricHandle, ScriptError> {
        Self::declare(ctx, name, MetricType::Counter, is_time)
    }

    pub fn gauge(
        ctx: &mut VuContext,
        name: &str,
        is_time: bool,
    ) -> Result<MetricHandle, ScriptError> {
        Self::declare(ctx, name, MetricType::Gauge, is_time)
    }

    pub fn trend(
        ctx: &mut VuContext,
        name: &str,
        is_time: bool,
    ) -> Result<MetricHandle, ScriptError> {
        Self::declare(ctx, name, MetricType::Trend, is_time)
    }

    pub fn rate(
        ctx: &mut VuContext,
        name: &str,
        is_time: bool,
    ) -> Result<MetricHandle, ScriptError> {
        Self::declare(ctx, name, MetricType::Rate, is_time)
    }

    pub fn declare(
        ctx: &mut VuContext,
        name: &str,
        metric_type: MetricType,
        is_time: bool,
    ) -> Result<MetricHandle, ScriptError> {
        let Some(init_env) = ctx.init_env.as_mut() else {
            return Err(ScriptError::DeclarationOutOfPhase);
        };
        let metric = init_env.registry_mut().get_or_new(
            name,
            metric_type,
            ValueType::from_is_time(is_time),
        )?;
        Ok(MetricHandle { metric })
    }
}

/// A declared metric as held by VU code.
#[derive(Clone)]
pub struct MetricHandle {
    metric: Arc<Metric>,
}

impl MetricHandle {
    #[inline]
    pub fn name(&self) -> &MetricName {
        self.metric.name()
    }

    #[inline]
    pub fn metric(&self) -> &Arc<Metric> {
        &self.metric
    }

    /// Add one sample with the VU tags and the given extra tags.
    ///
    /// An invalid value is an error in throw mode. Otherwise it is logged
    /// once as a warning, nothing is emitted and `Ok(false)` is returned.
    pub async fn add(
        &self,
        ctx: &VuContext,
        value: Option<&ScriptValue>,
        tags: Option<&ScriptObject>,
    ) -> Result<bool, ScriptError> {
        let Some(state) = ctx.state.as_ref() else {
            return Err(ScriptError::NoVuState);
        };

        match self.new_sample(state, value, tags) {
            Ok(sample) => {
                state.sender.push(sample.into()).await?;
                Ok(true)
            }
            Err(e) => {
                if state.options.throw {
                    Err(e)
                } else {
                    slog::warn!(state.logger, "{}", e; "metric" => self.name().as_str());
                    Ok(false)
                }
            }
        }
    }

    fn new_sample(
        &self,
        state: &VuState,
        value: Option<&ScriptValue>,
        tags: Option<&ScriptObject>,
    ) -> Result<Sample, ScriptError> {
        let Some(value) = value else {
            return Err(ScriptError::NoValue(self.name().clone()));
        };
        let Some(value) = value.as_sample_value() else {
            return Err(ScriptError::InvalidValue {
                metric: self.name().clone(),
                value: value.to_string(),
            });
        };

        let tags = match tags {
            Some(extra) if !extra.is_empty() => {
                let mut added = Vec::with_capacity(extra.len());
                for (k, v) in extra {
                    let name = MetricTagName::from_str(k).map_err(|_| {
                        ScriptError::InvalidTagName(k.clone(), self.name().clone())
                    })?;
                    added.push((name, MetricTagValue::from(v.to_tag_value())));
                }
                let added: MetricTagSet = added.into_iter().collect();
                Arc::new(state.tags.with_tags(&added))
            }
            _ => Arc::clone(&state.tags),
        };

        Ok(Sample::new(self.metric.clone(), value, tags))
    }
}

/// Handles are equal if they refer to the same metric.
impl PartialEq for MetricHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.metric, &other.metric)
    }
}

impl fmt::Debug for MetricHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricHandle")
            .field("metric", &self.metric.to_string())
            .finish()
    }
}
