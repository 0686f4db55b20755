/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, yaml};

use g3_load_types::MetricType;

use crate::script::{ScriptObject, ScriptValue};

/// How a VU produces the value of a metric on each iteration.
#[derive(Clone, Debug)]
pub enum ValueGenerator {
    Constant(ScriptValue),
    /// Uniformly distributed in `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// `true` with the given probability.
    Ratio(f64),
    /// Cycle through the values.
    Sequence(Vec<ScriptValue>),
}

impl Default for ValueGenerator {
    fn default() -> Self {
        ValueGenerator::Constant(ScriptValue::Number(1.0))
    }
}

impl ValueGenerator {
    fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            let value = super::value::as_script_value(v)?;
            return Ok(ValueGenerator::Constant(value));
        };
        if map.len() != 1 {
            return Err(anyhow!("exactly one generator kind should be set"));
        }

        let mut generator = ValueGenerator::default();
        super::value::foreach_kv(map, |k, v| {
            generator = match super::value::normalize_key(k).as_str() {
                "constant" => ValueGenerator::Constant(super::value::as_script_value(v)?),
                "uniform" => {
                    let range = super::value::as_list(v, super::value::as_f64)?;
                    let &[low, high] = range.as_slice() else {
                        return Err(anyhow!("uniform range should be [low, high]"));
                    };
                    if low > high {
                        return Err(anyhow!("invalid uniform range [{low}, {high}]"));
                    }
                    ValueGenerator::Uniform { low, high }
                }
                "ratio" => {
                    let p = super::value::as_f64(v)?;
                    if !(0.0..=1.0).contains(&p) {
                        return Err(anyhow!("ratio {p} is out of range [0, 1]"));
                    }
                    ValueGenerator::Ratio(p)
                }
                "sequence" => {
                    let values = super::value::as_list(v, super::value::as_script_value)?;
                    if values.is_empty() {
                        return Err(anyhow!("empty sequence"));
                    }
                    ValueGenerator::Sequence(values)
                }
                _ => return Err(anyhow!("invalid generator kind {k}")),
            };
            Ok(())
        })?;
        Ok(generator)
    }
}

/// A metric declared by every VU during init.
#[derive(Clone, Debug)]
pub struct MetricConfig {
    pub name: String,
    pub metric_type: MetricType,
    pub is_time: bool,
    pub tags: ScriptObject,
    pub generator: ValueGenerator,
}

impl MetricConfig {
    pub(super) fn parse(name: &str, v: &Yaml) -> anyhow::Result<Self> {
        let map: &yaml::Hash = super::value::as_hash(v)?;

        let mut metric_type = None;
        let mut config = MetricConfig {
            name: name.to_string(),
            metric_type: MetricType::Counter,
            is_time: false,
            tags: ScriptObject::new(),
            generator: ValueGenerator::default(),
        };
        super::value::foreach_kv(map, |k, v| match super::value::normalize_key(k).as_str() {
            "type" => {
                let s = super::value::as_string(v)?;
                metric_type = Some(MetricType::from_str(&s)?);
                Ok(())
            }
            "time" | "is_time" => {
                config.is_time = super::value::as_bool(v)?;
                Ok(())
            }
            "tags" => {
                let ScriptValue::Object(tags) = super::value::as_script_value(v)? else {
                    return Err(anyhow!("tags should be a map"));
                };
                config.tags = tags;
                Ok(())
            }
            "generator" => {
                config.generator = ValueGenerator::parse(v)
                    .context(format!("invalid generator value for key {k}"))?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        config.metric_type = metric_type.ok_or_else(|| anyhow!("no metric type set"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn parse(s: &str) -> anyhow::Result<MetricConfig> {
        let doc = YamlLoader::load_from_str(s).unwrap().remove(0);
        MetricConfig::parse("m", &doc)
    }

    #[test]
    fn generators() {
        let m = parse("{type: trend, time: true, generator: {uniform: [10, 20]}}").unwrap();
        assert_eq!(m.metric_type, MetricType::Trend);
        assert!(m.is_time);
        assert!(matches!(
            m.generator,
            ValueGenerator::Uniform { low, high } if low == 10.0 && high == 20.0
        ));

        let m = parse("{type: rate, generator: {ratio: 0.25}}").unwrap();
        assert!(matches!(m.generator, ValueGenerator::Ratio(p) if p == 0.25));

        let m = parse("{type: gauge, generator: {sequence: [1, 2, 3]}}").unwrap();
        assert!(matches!(m.generator, ValueGenerator::Sequence(ref v) if v.len() == 3));

        let m = parse("{type: counter, generator: abc}").unwrap();
        assert!(matches!(m.generator, ValueGenerator::Constant(ScriptValue::String(_))));

        let m = parse("{type: Counter, tags: {kind: x}}").unwrap();
        assert!(matches!(
            m.generator,
            ValueGenerator::Constant(ScriptValue::Number(n)) if n == 1.0
        ));
        assert_eq!(m.tags.len(), 1);
    }

    #[test]
    fn invalid() {
        assert!(parse("{time: true}").is_err());
        assert!(parse("{type: histogram}").is_err());
        assert!(parse("{type: rate, generator: {ratio: 2}}").is_err());
        assert!(parse("{type: trend, generator: {uniform: [5, 1]}}").is_err());
        assert!(parse("{type: trend, generator: {uniform: [1]}}").is_err());
        assert!(parse("{type: trend, generator: {sequence: []}}").is_err());
        assert!(parse("{type: trend, generator: {ratio: 0.1, constant: 1}}").is_err());
        assert!(parse("{type: trend, colour: red}").is_err());
    }
}
