/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use super::{AggregationMethod, ThresholdError, ThresholdOperator};

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdExpression {
    method: AggregationMethod,
    operator: ThresholdOperator,
    value: f64,
}

impl ThresholdExpression {
    pub fn new(method: AggregationMethod, operator: ThresholdOperator, value: f64) -> Self {
        ThresholdExpression {
            method,
            operator,
            value,
        }
    }

    #[inline]
    pub fn method(&self) -> &AggregationMethod {
        &self.method
    }

    #[inline]
    pub fn operator(&self) -> ThresholdOperator {
        self.operator
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Compare the aggregated value `actual` with the expected value.
    pub fn evaluate(&self, actual: f64) -> bool {
        self.operator.compare(actual, self.value)
    }
}

impl FromStr for ThresholdExpression {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_threshold_expression(s)
    }
}

impl fmt::Display for ThresholdExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.method, self.operator, self.value)
    }
}

/// Split an expression into its method text, operator and value text.
///
/// Operators are tried in [`ThresholdOperator::SCAN_ORDER`] and the input is
/// split at the first occurrence of the first one found.
pub fn scan_threshold_expression(
    input: &str,
) -> Result<(&str, ThresholdOperator, &str), ThresholdError> {
    for op in ThresholdOperator::SCAN_ORDER {
        if let Some((method, value)) = input.split_once(op.as_str()) {
            return Ok((method.trim(), op, value.trim()));
        }
    }
    Err(ThresholdError::MalformedExpression(input.to_string()))
}

pub fn parse_threshold_expression(input: &str) -> Result<ThresholdExpression, ThresholdError> {
    let (method, operator, value) = scan_threshold_expression(input)?;
    let (method, _) = super::parse_threshold_aggregation_method(method)?;

    let number = f64::from_str(value)
        .map_err(|_| ThresholdError::NonNumericThresholdValue(value.to_string()))?;
    if number.is_nan() {
        return Err(ThresholdError::NonNumericThresholdValue(value.to_string()));
    }

    Ok(ThresholdExpression::new(method, operator, number))
}
