/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

/// One threshold as written in the config file, not parsed yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdEntry {
    pub source: String,
    pub abort_on_fail: bool,
    pub delay_abort_eval: Duration,
}

impl ThresholdEntry {
    fn new(source: String) -> Self {
        ThresholdEntry {
            source,
            abort_on_fail: false,
            delay_abort_eval: Duration::ZERO,
        }
    }

    fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            let source = super::value::as_string(v)?;
            return Ok(ThresholdEntry::new(source));
        };

        let mut source = None;
        let mut entry = ThresholdEntry::new(String::new());
        super::value::foreach_kv(map, |k, v| match super::value::normalize_key(k).as_str() {
            "threshold" => {
                source = Some(super::value::as_string(v)?);
                Ok(())
            }
            "abort_on_fail" | "abortonfail" => {
                entry.abort_on_fail = super::value::as_bool(v)?;
                Ok(())
            }
            "delay_abort_eval" | "delayaborteval" => {
                entry.delay_abort_eval = super::value::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        entry.source = source.ok_or_else(|| anyhow!("no threshold expression set"))?;
        Ok(entry)
    }
}

/// All thresholds of one metric key, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub key: String,
    pub entries: Vec<ThresholdEntry>,
}

impl ThresholdConfig {
    pub fn new(key: &str, entries: Vec<ThresholdEntry>) -> Self {
        ThresholdConfig {
            key: key.to_string(),
            entries,
        }
    }

    pub(super) fn parse(key: &str, v: &Yaml) -> anyhow::Result<Self> {
        let entries = super::value::as_list(v, ThresholdEntry::parse)?;
        Ok(ThresholdConfig::new(key, entries))
    }
}

/// Build a plain threshold entry, mostly useful to assemble configs in code.
impl From<&str> for ThresholdEntry {
    fn from(value: &str) -> Self {
        ThresholdEntry::new(value.to_string())
    }
}
