/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::{Yaml, yaml};

use g3_load_types::{MetricTagName, MetricTagSet, MetricTagValue};

use crate::script::{ScriptObject, ScriptValue};

pub(super) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

pub(super) fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

pub(super) fn as_hash(v: &Yaml) -> anyhow::Result<&yaml::Hash> {
    v.as_hash()
        .ok_or_else(|| anyhow!("yaml value type should be 'map'"))
}

pub(super) fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::Boolean(b) => Ok(*b),
        Yaml::Integer(i) => Ok(*i != 0),
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for 'bool': {s}")),
        },
        _ => Err(anyhow!(
            "yaml value type for 'bool' should be 'boolean' / 'string' / 'integer'"
        )),
    }
}

pub(super) fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => Ok(usize::from_str(s)?),
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

pub(super) fn as_f64(v: &Yaml) -> anyhow::Result<f64> {
    match v {
        Yaml::String(s) | Yaml::Real(s) => Ok(f64::from_str(s)?),
        Yaml::Integer(i) => Ok(*i as f64),
        _ => Err(anyhow!(
            "yaml value type for 'f64' should be 'string', 'integer' or 'real'"
        )),
    }
}

pub(super) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) | Yaml::Real(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real' / 'boolean'"
        )),
    }
}

/// Humanize duration string like `1m30s`, a plain number is in seconds.
pub(super) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(s) {
                    Ok(Duration::from_secs(u))
                } else {
                    Err(anyhow!("invalid duration string {s}"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string {s}: {e}")),
        },
        Yaml::Integer(i) => {
            let secs = u64::try_from(*i).map_err(|_| anyhow!("negative duration {i}"))?;
            Ok(Duration::from_secs(secs))
        }
        Yaml::Real(s) => {
            let f = f64::from_str(s)?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}

pub(super) fn as_list<T, F>(v: &Yaml, convert: F) -> anyhow::Result<Vec<T>>
where
    F: Fn(&Yaml) -> anyhow::Result<T>,
{
    match v {
        Yaml::Array(seq) => {
            let mut vec = Vec::with_capacity(seq.len());
            for (i, v) in seq.iter().enumerate() {
                let node = convert(v).context(format!("invalid value for list element #{i}"))?;
                vec.push(node);
            }
            Ok(vec)
        }
        _ => {
            let node = convert(v).context("invalid single value for the list")?;
            Ok(vec![node])
        }
    }
}

pub(super) fn as_tag_set(v: &Yaml) -> anyhow::Result<MetricTagSet> {
    let map = as_hash(v)?;
    let mut tags = Vec::with_capacity(map.len());
    foreach_kv(map, |k, v| {
        let name = MetricTagName::from_str(k).map_err(|e| anyhow!("invalid tag name: {e}"))?;
        let value = as_string(v)?;
        tags.push((name, MetricTagValue::from(value)));
        Ok(())
    })?;
    Ok(tags.into_iter().collect())
}

pub(super) fn as_script_value(v: &Yaml) -> anyhow::Result<ScriptValue> {
    match v {
        Yaml::Null => Ok(ScriptValue::Null),
        Yaml::Boolean(b) => Ok(ScriptValue::Bool(*b)),
        Yaml::Integer(i) => Ok(ScriptValue::Number(*i as f64)),
        Yaml::Real(s) => {
            let f = v
                .as_f64()
                .ok_or_else(|| anyhow!("invalid real value {s}"))?;
            Ok(ScriptValue::Number(f))
        }
        Yaml::String(s) => Ok(ScriptValue::String(s.to_string())),
        Yaml::Hash(map) => {
            let mut object = ScriptObject::new();
            foreach_kv(map, |k, v| {
                object.insert(k.to_string(), as_script_value(v)?);
                Ok(())
            })?;
            Ok(ScriptValue::Object(object))
        }
        _ => Err(anyhow!("unsupported yaml value type for script value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn doc(s: &str) -> Yaml {
        YamlLoader::load_from_str(s).unwrap().remove(0)
    }

    #[test]
    fn duration() {
        assert_eq!(
            as_duration(&doc("1m30s")).unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(as_duration(&doc("30")).unwrap(), Duration::from_secs(30));
        assert_eq!(
            as_duration(&doc("\"100ms\"")).unwrap(),
            Duration::from_millis(100)
        );
        assert_eq!(
            as_duration(&doc("0.5")).unwrap(),
            Duration::from_millis(500)
        );
        assert!(as_duration(&doc("-1")).is_err());
        assert!(as_duration(&doc("abc")).is_err());
    }

    #[test]
    fn key() {
        assert_eq!(normalize_key("abort-on-fail"), "abort_on_fail");
        assert_eq!(normalize_key("abortOnFail"), "abortonfail");
    }

    #[test]
    fn tag_set() {
        let tags = as_tag_set(&doc("{scenario: smoke, attempt: 2}")).unwrap();
        assert_eq!(tags.get("scenario"), Some("smoke"));
        assert_eq!(tags.get("attempt"), Some("2"));
        assert!(as_tag_set(&doc("[a, b]")).is_err());
    }

    #[test]
    fn script_value() {
        assert!(matches!(
            as_script_value(&doc("2.5")).unwrap(),
            ScriptValue::Number(n) if n == 2.5
        ));
        assert!(matches!(
            as_script_value(&doc("~")).unwrap(),
            ScriptValue::Null
        ));
        assert!(matches!(
            as_script_value(&doc("\"5.3\"")).unwrap(),
            ScriptValue::String(_)
        ));
        assert!(matches!(
            as_script_value(&doc("{a: 1}")).unwrap(),
            ScriptValue::Object(_)
        ));
    }
}
