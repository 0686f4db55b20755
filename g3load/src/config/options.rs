/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml};

use g3_load_types::MetricTagSet;

const DEFAULT_DURATION: Duration = Duration::from_secs(10);
const DEFAULT_EVALUATION_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_GRACE_STOP: Duration = Duration::from_secs(5);
const DEFAULT_ITERATION_PAUSE: Duration = Duration::from_millis(100);
const DEFAULT_PIPELINE_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub vus: usize,
    pub duration: Duration,
    pub iterations: Option<usize>,
    pub throw: bool,
    pub no_thresholds: bool,
    pub evaluation_interval: Duration,
    pub pipeline_capacity: usize,
    pub grace_stop: Duration,
    pub iteration_pause: Duration,
    pub tags: MetricTagSet,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            vus: 1,
            duration: DEFAULT_DURATION,
            iterations: None,
            throw: false,
            no_thresholds: false,
            evaluation_interval: DEFAULT_EVALUATION_INTERVAL,
            pipeline_capacity: DEFAULT_PIPELINE_CAPACITY,
            grace_stop: DEFAULT_GRACE_STOP,
            iteration_pause: DEFAULT_ITERATION_PAUSE,
            tags: MetricTagSet::default(),
        }
    }
}

impl RunOptions {
    pub(super) fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut options = RunOptions::default();
        super::value::foreach_kv(map, |k, v| options.set(k, v))?;
        options.check()?;
        Ok(options)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match super::value::normalize_key(k).as_str() {
            "vus" => {
                self.vus = super::value::as_usize(v)?;
                Ok(())
            }
            "duration" => {
                self.duration = super::value::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "iterations" => {
                self.iterations = Some(super::value::as_usize(v)?);
                Ok(())
            }
            "throw" => {
                self.throw = super::value::as_bool(v)?;
                Ok(())
            }
            "no_thresholds" | "nothresholds" => {
                self.no_thresholds = super::value::as_bool(v)?;
                Ok(())
            }
            "evaluation_interval" => {
                self.evaluation_interval = super::value::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "pipeline_capacity" => {
                self.pipeline_capacity = super::value::as_usize(v)?;
                Ok(())
            }
            "grace_stop" => {
                self.grace_stop = super::value::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "iteration_pause" => {
                self.iteration_pause = super::value::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            "tags" => {
                self.tags = super::value::as_tag_set(v)
                    .context(format!("invalid tag map value for key {k}"))?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    pub(super) fn check(&self) -> anyhow::Result<()> {
        if self.vus == 0 {
            return Err(anyhow!("vus should be at least 1"));
        }
        if self.pipeline_capacity == 0 {
            return Err(anyhow!("pipeline capacity should not be 0"));
        }
        if self.evaluation_interval.is_zero() {
            return Err(anyhow!("evaluation interval should not be 0"));
        }
        if self.duration.is_zero() && self.iterations.is_none() {
            return Err(anyhow!("either duration or iterations should be set"));
        }
        Ok(())
    }
}

/// Options set on the command line, they take precedence over the file.
#[derive(Clone, Debug, Default)]
pub struct RunOverrides {
    pub vus: Option<usize>,
    pub duration: Option<Duration>,
    pub iterations: Option<usize>,
    pub evaluation_interval: Option<Duration>,
    pub throw: bool,
    pub no_thresholds: bool,
}

impl RunOverrides {
    pub fn apply(&self, options: &mut RunOptions) -> anyhow::Result<()> {
        if let Some(vus) = self.vus {
            options.vus = vus;
        }
        if let Some(duration) = self.duration {
            options.duration = duration;
        }
        if let Some(iterations) = self.iterations {
            options.iterations = Some(iterations);
        }
        if let Some(interval) = self.evaluation_interval {
            options.evaluation_interval = interval;
        }
        if self.throw {
            options.throw = true;
        }
        if self.no_thresholds {
            options.no_thresholds = true;
        }
        options.check().context("invalid options after command line overrides")
    }
}
