/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::MetricHandle;

pub type ScriptObject = BTreeMap<String, ScriptValue>;

/// A dynamically typed value as seen by VU code.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(ScriptObject),
    Metric(MetricHandle),
}

impl ScriptValue {
    /// Coerce to a sample value.
    ///
    /// Booleans are 1 or 0, numeric strings are parsed. Anything that does
    /// not end up as a finite number is rejected.
    pub fn as_sample_value(&self) -> Option<f64> {
        let v = match self {
            ScriptValue::Bool(true) => 1.0,
            ScriptValue::Bool(false) => 0.0,
            ScriptValue::Number(n) => *n,
            ScriptValue::String(s) => f64::from_str(s.trim()).ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// String form used for tag values.
    pub fn to_tag_value(&self) -> String {
        match self {
            ScriptValue::String(s) => s.clone(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => f.write_str("undefined"),
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => {
                if n.is_nan() {
                    f.write_str("NaN")
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buffer = itoa::Buffer::new();
                    f.write_str(buffer.format(*n as i64))
                } else if n.is_finite() {
                    let mut buffer = ryu::Buffer::new();
                    f.write_str(buffer.format_finite(*n))
                } else if n.is_sign_positive() {
                    f.write_str("Infinity")
                } else {
                    f.write_str("-Infinity")
                }
            }
            ScriptValue::String(s) => f.write_str(s),
            ScriptValue::Object(_) | ScriptValue::Metric(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}
