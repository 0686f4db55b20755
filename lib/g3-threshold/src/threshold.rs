/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use g3_load_types::MetricType;

use super::{AggregationMethod, ThresholdError, ThresholdExpression};

const EXPRESSION_JOINER: &str = "&&";

/// Something that can resolve aggregated values, usually a sink snapshot.
pub trait AggregateSource {
    fn aggregate(&self, method: &AggregationMethod) -> Option<f64>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Threshold {
    source: String,
    expressions: Vec<ThresholdExpression>,
    abort_on_fail: bool,
    abort_grace_period: Duration,
}

impl Threshold {
    pub fn parse(source: &str) -> Result<Self, ThresholdError> {
        let mut expressions = Vec::with_capacity(1);
        for part in source.split(EXPRESSION_JOINER) {
            expressions.push(super::parse_threshold_expression(part)?);
        }
        Ok(Threshold {
            source: source.trim().to_string(),
            expressions,
            abort_on_fail: false,
            abort_grace_period: Duration::ZERO,
        })
    }

    pub fn with_abort(mut self, abort_on_fail: bool, grace_period: Duration) -> Self {
        self.abort_on_fail = abort_on_fail;
        self.abort_grace_period = grace_period;
        self
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn expressions(&self) -> &[ThresholdExpression] {
        &self.expressions
    }

    #[inline]
    pub fn abort_on_fail(&self) -> bool {
        self.abort_on_fail
    }

    #[inline]
    pub fn abort_grace_period(&self) -> Duration {
        self.abort_grace_period
    }

    pub fn check_metric_type(&self, metric_type: MetricType) -> Result<(), ThresholdError> {
        for expr in &self.expressions {
            if !expr.method().supported_by(metric_type) {
                return Err(ThresholdError::UnsupportedAggregationMethod {
                    method: expr.method().to_string(),
                    metric_type,
                });
            }
        }
        Ok(())
    }

    /// Evaluate all expressions, the threshold passes only if all of them pass.
    pub fn run<S>(&self, source: &S) -> Result<bool, ThresholdError>
    where
        S: AggregateSource + ?Sized,
    {
        let mut passed = true;
        for expr in &self.expressions {
            let Some(actual) = source.aggregate(expr.method()) else {
                return Err(ThresholdError::AggregationUnavailable(
                    expr.method().to_string(),
                ));
            };
            if !expr.evaluate(actual) {
                passed = false;
            }
        }
        Ok(passed)
    }

    /// Check if a failure of this threshold should abort the run at `elapsed`.
    pub fn abort_due(&self, elapsed: Duration) -> bool {
        self.abort_on_fail && elapsed >= self.abort_grace_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<(&'static str, f64)>);

    impl AggregateSource for Fixed {
        fn aggregate(&self, method: &AggregationMethod) -> Option<f64> {
            self.0
                .iter()
                .find(|(name, _)| *name == method.as_str())
                .map(|(_, v)| *v)
        }
    }

    #[test]
    fn single() {
        let t = Threshold::parse("p(95)<200").unwrap();
        assert_eq!(t.expressions().len(), 1);
        assert!(t.run(&Fixed(vec![("p(95)", 150.0)])).unwrap());
        assert!(!t.run(&Fixed(vec![("p(95)", 250.0)])).unwrap());
    }

    #[test]
    fn joined() {
        let t = Threshold::parse("p(95)<200 && avg<100").unwrap();
        assert_eq!(t.expressions().len(), 2);
        assert_eq!(t.source(), "p(95)<200 && avg<100");

        let source = Fixed(vec![("p(95)", 150.0), ("avg", 50.0)]);
        assert!(t.run(&source).unwrap());
        let source = Fixed(vec![("p(95)", 150.0), ("avg", 120.0)]);
        assert!(!t.run(&source).unwrap());
    }

    #[test]
    fn joined_invalid() {
        assert!(Threshold::parse("p(95)<200 &&").is_err());
        assert!(Threshold::parse("p(95)<200 && foo<1").is_err());
    }

    #[test]
    fn unavailable() {
        let t = Threshold::parse("med<10").unwrap();
        assert_eq!(
            t.run(&Fixed(vec![])),
            Err(ThresholdError::AggregationUnavailable("med".to_string()))
        );
    }

    #[test]
    fn metric_type() {
        let t = Threshold::parse("value<3").unwrap();
        assert!(t.check_metric_type(MetricType::Gauge).is_ok());
        assert!(matches!(
            t.check_metric_type(MetricType::Trend),
            Err(ThresholdError::UnsupportedAggregationMethod { .. })
        ));
    }

    #[test]
    fn abort_grace() {
        let t = Threshold::parse("rate>0.9").unwrap();
        assert!(!t.abort_due(Duration::from_secs(100)));

        let t = t.with_abort(true, Duration::from_secs(10));
        assert!(!t.abort_due(Duration::from_secs(5)));
        assert!(t.abort_due(Duration::from_secs(10)));
        assert!(t.abort_due(Duration::from_secs(11)));
    }
}
