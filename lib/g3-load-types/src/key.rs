/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use memchr::memchr;

use super::{MetricName, MetricTagName, MetricTagSet, MetricTagValue, ParseError};

/// A metric name with an optional tag selector, as in `http_req_duration{status:200}`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricKey {
    name: MetricName,
    selector: Option<MetricTagSet>,
}

impl MetricKey {
    pub fn new(name: MetricName) -> Self {
        MetricKey {
            name,
            selector: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    #[inline]
    pub fn selector(&self) -> Option<&MetricTagSet> {
        self.selector.as_ref()
    }

    #[inline]
    pub fn is_submetric(&self) -> bool {
        self.selector.is_some()
    }
}

impl FromStr for MetricKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(p) = memchr(b'{', s.as_bytes()) else {
            let name = MetricName::from_str(s)?;
            return Ok(MetricKey::new(name));
        };

        let name = MetricName::from_str(s[..p].trim_end())?;
        let Some(body) = s[p + 1..].strip_suffix('}') else {
            return Err(ParseError::InvalidSelector("missing closing brace"));
        };
        if body.trim().is_empty() {
            return Err(ParseError::InvalidSelector("empty selector"));
        }

        let mut tags = Vec::new();
        for part in body.split(',') {
            let Some(d) = memchr(b':', part.as_bytes()) else {
                return Err(ParseError::InvalidSelector("no ':' in tag pair"));
            };
            let tag_name = MetricTagName::from_str(part[..d].trim())?;
            let tag_value = part[d + 1..].trim().trim_matches('"');
            tags.push((tag_name, MetricTagValue::from(tag_value)));
        }

        Ok(MetricKey {
            name,
            selector: Some(tags.into_iter().collect()),
        })
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        if let Some(selector) = &self.selector {
            write!(f, "{{{selector}}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain() {
        let key = MetricKey::from_str("http_reqs").unwrap();
        assert_eq!(key.name().as_str(), "http_reqs");
        assert!(!key.is_submetric());
        assert_eq!(key.to_string(), "http_reqs");
    }

    #[test]
    fn with_selector() {
        let key = MetricKey::from_str("http_req_duration{ status: 200 ,method:GET}").unwrap();
        assert_eq!(key.name().as_str(), "http_req_duration");
        let selector = key.selector().unwrap();
        assert_eq!(selector.get("status"), Some("200"));
        assert_eq!(selector.get("method"), Some("GET"));
        assert_eq!(
            key.to_string(),
            "http_req_duration{method:GET,status:200}"
        );
    }

    #[test]
    fn invalid() {
        assert!(MetricKey::from_str("http_reqs{status:200").is_err());
        assert!(MetricKey::from_str("http_reqs{}").is_err());
        assert!(MetricKey::from_str("http_reqs{status}").is_err());
        assert!(MetricKey::from_str("{status:200}").is_err());
        assert!(MetricKey::from_str("http reqs").is_err());
    }
}
