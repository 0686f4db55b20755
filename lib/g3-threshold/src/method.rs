/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use g3_load_types::MetricType;

use super::ThresholdError;

const METHOD_COUNT: &str = "count";
const METHOD_RATE: &str = "rate";
const METHOD_VALUE: &str = "value";
const METHOD_AVG: &str = "avg";
const METHOD_MIN: &str = "min";
const METHOD_MAX: &str = "max";
const METHOD_MED: &str = "med";

const PERCENTILE_PREFIX: &str = "p(";

#[derive(Clone, Debug, PartialEq)]
pub enum AggregationMethod {
    Count,
    Rate,
    Value,
    Avg,
    Min,
    Max,
    Med,
    /// `p(N)`, keeps the text it was parsed from for display.
    Percentile { pct: f64, text: String },
}

impl AggregationMethod {
    pub fn as_str(&self) -> &str {
        match self {
            AggregationMethod::Count => METHOD_COUNT,
            AggregationMethod::Rate => METHOD_RATE,
            AggregationMethod::Value => METHOD_VALUE,
            AggregationMethod::Avg => METHOD_AVG,
            AggregationMethod::Min => METHOD_MIN,
            AggregationMethod::Max => METHOD_MAX,
            AggregationMethod::Med => METHOD_MED,
            AggregationMethod::Percentile { text, .. } => text.as_str(),
        }
    }

    pub fn percentile(&self) -> Option<f64> {
        match self {
            AggregationMethod::Percentile { pct, .. } => Some(*pct),
            _ => None,
        }
    }

    pub fn supported_by(&self, metric_type: MetricType) -> bool {
        match metric_type {
            MetricType::Counter => {
                matches!(self, AggregationMethod::Count | AggregationMethod::Rate)
            }
            MetricType::Gauge => matches!(
                self,
                AggregationMethod::Value | AggregationMethod::Min | AggregationMethod::Max
            ),
            MetricType::Trend => matches!(
                self,
                AggregationMethod::Count
                    | AggregationMethod::Avg
                    | AggregationMethod::Min
                    | AggregationMethod::Max
                    | AggregationMethod::Med
                    | AggregationMethod::Percentile { .. }
            ),
            MetricType::Rate => matches!(self, AggregationMethod::Rate),
        }
    }
}

impl FromStr for AggregationMethod {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_threshold_aggregation_method(s).map(|(method, _)| method)
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the aggregation method part of a threshold expression.
///
/// Returns the method and, for `p(N)`, the percentile value `N`.
pub fn parse_threshold_aggregation_method(
    input: &str,
) -> Result<(AggregationMethod, Option<f64>), ThresholdError> {
    let method = match input {
        METHOD_COUNT => AggregationMethod::Count,
        METHOD_RATE => AggregationMethod::Rate,
        METHOD_VALUE => AggregationMethod::Value,
        METHOD_AVG => AggregationMethod::Avg,
        METHOD_MIN => AggregationMethod::Min,
        METHOD_MAX => AggregationMethod::Max,
        METHOD_MED => AggregationMethod::Med,
        _ => {
            let Some(left) = input.strip_prefix(PERCENTILE_PREFIX) else {
                return Err(ThresholdError::UnknownAggregationMethod(input.to_string()));
            };
            let pct = parse_percentile(input, left)?;
            let method = AggregationMethod::Percentile {
                pct,
                text: input.to_string(),
            };
            return Ok((method, Some(pct)));
        }
    };
    Ok((method, None))
}

fn parse_percentile(input: &str, left: &str) -> Result<f64, ThresholdError> {
    let malformed = |reason: &'static str| ThresholdError::MalformedPercentileExpression {
        expr: input.to_string(),
        reason,
    };

    let Some(value) = left.strip_suffix(')') else {
        return Err(malformed("missing closing parenthesis"));
    };
    if value.is_empty() {
        return Err(malformed("empty percentile value"));
    }

    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in value.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return Err(malformed("percentile value is not a decimal number")),
        }
    }
    if digits == 0 || dots > 1 {
        return Err(malformed("percentile value is not a decimal number"));
    }

    let pct = f64::from_str(value).map_err(|_| malformed("percentile value is not a number"))?;
    if pct > 100.0 {
        return Err(malformed("percentile value should not be larger than 100"));
    }
    Ok(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_methods() {
        for name in ["count", "rate", "value", "avg", "min", "max", "med"] {
            let (method, value) = parse_threshold_aggregation_method(name).unwrap();
            assert_eq!(method.as_str(), name);
            assert!(value.is_none());
        }
    }

    #[test]
    fn percentile_integer() {
        let (method, value) = parse_threshold_aggregation_method("p(99)").unwrap();
        assert_eq!(method.to_string(), "p(99)");
        assert_eq!(value, Some(99.0));
        assert_eq!(method.percentile(), Some(99.0));
    }

    #[test]
    fn percentile_float() {
        let (method, value) = parse_threshold_aggregation_method("p(99.9)").unwrap();
        assert_eq!(method.to_string(), "p(99.9)");
        assert_eq!(value, Some(99.9));
    }

    #[test]
    fn unknown_method() {
        assert_eq!(
            parse_threshold_aggregation_method("foo"),
            Err(ThresholdError::UnknownAggregationMethod("foo".to_string()))
        );
        assert!(matches!(
            parse_threshold_aggregation_method("Count"),
            Err(ThresholdError::UnknownAggregationMethod(_))
        ));
    }

    #[test]
    fn malformed_percentile() {
        for input in ["p()", "p(99", "p(foo)", "p(-1)", "p(1.2.3)", "p(.)", "p(101)", "p( 9)"] {
            assert!(
                matches!(
                    parse_threshold_aggregation_method(input),
                    Err(ThresholdError::MalformedPercentileExpression { .. })
                ),
                "input {input} should be rejected"
            );
        }
    }

    #[test]
    fn metric_type_support() {
        let p95 = AggregationMethod::from_str("p(95)").unwrap();
        assert!(p95.supported_by(MetricType::Trend));
        assert!(!p95.supported_by(MetricType::Counter));
        assert!(AggregationMethod::Rate.supported_by(MetricType::Rate));
        assert!(AggregationMethod::Rate.supported_by(MetricType::Counter));
        assert!(!AggregationMethod::Value.supported_by(MetricType::Trend));
        assert!(AggregationMethod::Value.supported_by(MetricType::Gauge));
        assert!(AggregationMethod::Count.supported_by(MetricType::Trend));
    }
}
