/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

mod value;

mod options;
pub use options::{RunOptions, RunOverrides};

mod metric;
pub use metric::{MetricConfig, ValueGenerator};

mod threshold;
pub use threshold::{ThresholdConfig, ThresholdEntry};

mod abort;
pub use abort::{AbortConfig, AbortPoint};

/// Everything a run is made of.
///
/// Threshold expressions are kept as text here, they are only parsed
/// when the thresholds are validated for a run.
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    pub options: RunOptions,
    pub metrics: Vec<MetricConfig>,
    pub thresholds: Vec<ThresholdConfig>,
    pub abort: Option<AbortConfig>,
}

impl RunConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
        RunConfig::load_str(&content).context(format!("invalid config file {}", path.display()))
    }

    pub fn load_str(content: &str) -> anyhow::Result<Self> {
        let docs =
            YamlLoader::load_from_str(content).map_err(|e| anyhow!("invalid yaml: {e}"))?;
        match docs.first() {
            Some(Yaml::Hash(map)) => RunConfig::parse(map),
            Some(Yaml::Null) | None => Ok(RunConfig::default()),
            Some(_) => Err(anyhow!("the root of the config should be a map")),
        }
    }

    fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut config = RunConfig::default();
        value::foreach_kv(map, |k, v| config.set(k, v))?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match value::normalize_key(k).as_str() {
            "options" => {
                self.options = RunOptions::parse(value::as_hash(v)?)?;
                Ok(())
            }
            "metrics" => {
                let map = value::as_hash(v)?;
                value::foreach_kv(map, |name, v| {
                    self.metrics.push(MetricConfig::parse(name, v)?);
                    Ok(())
                })
            }
            "thresholds" => {
                let map = value::as_hash(v)?;
                value::foreach_kv(map, |key, v| {
                    self.thresholds.push(ThresholdConfig::parse(key, v)?);
                    Ok(())
                })
            }
            "abort" => {
                let abort =
                    AbortConfig::parse(v).context(format!("invalid value for key {k}"))?;
                self.abort = Some(abort);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}
