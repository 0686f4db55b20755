/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use super::ParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Trend,
    Rate,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Trend => "trend",
            MetricType::Rate => "rate",
        }
    }
}

impl FromStr for MetricType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "trend" => Ok(MetricType::Trend),
            "rate" => Ok(MetricType::Rate),
            _ => Err(ParseError::UnknownMetricType(s.to_string())),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the values of a metric represent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueType {
    #[default]
    Default,
    /// Values are durations in milliseconds.
    Time,
}

impl ValueType {
    pub const fn from_is_time(is_time: bool) -> Self {
        if is_time {
            ValueType::Time
        } else {
            ValueType::Default
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueType::Default => "default",
            ValueType::Time => "time",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
