/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

/// Where the VU code aborts the test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortPoint {
    /// While declaring metrics, before any VU starts iterating.
    Init,
    /// At the start of the iteration with this id, counted over all VUs.
    Iteration(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbortConfig {
    pub point: AbortPoint,
    pub reason: Option<String>,
}

impl AbortConfig {
    pub(super) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let map = super::value::as_hash(v)?;

        let mut point = None;
        let mut reason = None;
        super::value::foreach_kv(map, |k, v| match super::value::normalize_key(k).as_str() {
            "init" => {
                if super::value::as_bool(v)? {
                    set_point(&mut point, AbortPoint::Init)?;
                }
                Ok(())
            }
            "iteration" => {
                let id = super::value::as_usize(v)?;
                set_point(&mut point, AbortPoint::Iteration(id))
            }
            "reason" => {
                reason = Some(super::value::as_string(v)?);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        let point = point.ok_or_else(|| anyhow!("neither init nor iteration is set"))?;
        Ok(AbortConfig { point, reason })
    }
}

fn set_point(point: &mut Option<AbortPoint>, new: AbortPoint) -> anyhow::Result<()> {
    if point.replace(new).is_some() {
        return Err(anyhow!("only one of init and iteration can be set"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn parse(s: &str) -> anyhow::Result<AbortConfig> {
        let doc = YamlLoader::load_from_str(s).unwrap().remove(0);
        AbortConfig::parse(&doc)
    }

    #[test]
    fn points() {
        let c = parse("{init: true}").unwrap();
        assert_eq!(c.point, AbortPoint::Init);
        assert!(c.reason.is_none());

        let c = parse("{iteration: 3, reason: backend is down}").unwrap();
        assert_eq!(c.point, AbortPoint::Iteration(3));
        assert_eq!(c.reason.as_deref(), Some("backend is down"));
    }

    #[test]
    fn invalid() {
        assert!(parse("{init: false}").is_err());
        assert!(parse("{reason: x}").is_err());
        assert!(parse("{init: true, iteration: 1}").is_err());
        assert!(parse("{iteration: -1}").is_err());
        assert!(parse("{teardown: true}").is_err());
        assert!(parse("init").is_err());
    }
}
