/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use super::{ParseError, check_identifier};

/// Name of a metric, unique within one run.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricName(String);

impl MetricName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MetricName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_identifier(s)?;
        Ok(MetricName(s.to_string()))
    }
}

impl Borrow<str> for MetricName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
