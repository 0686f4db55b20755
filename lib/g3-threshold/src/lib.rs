/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Threshold expressions like `p(95)<200`, evaluated against aggregated metric values.
//!
//! An expression is `<method><operator><value>`, surrounding whitespace of the
//! method and the value is ignored. Several expressions can be joined by `&&`
//! in one threshold, all of them must pass for the threshold to pass.

use thiserror::Error;

use g3_load_types::MetricType;

mod operator;
pub use operator::ThresholdOperator;

mod method;
pub use method::{AggregationMethod, parse_threshold_aggregation_method};

mod expression;
pub use expression::{ThresholdExpression, parse_threshold_expression, scan_threshold_expression};

mod threshold;
pub use threshold::{AggregateSource, Threshold};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("malformed threshold expression {0:?}: no known comparison operator found")]
    MalformedExpression(String),
    #[error("unknown aggregation method {0:?}")]
    UnknownAggregationMethod(String),
    #[error("malformed percentile expression {expr:?}: {reason}")]
    MalformedPercentileExpression { expr: String, reason: &'static str },
    #[error("non numeric threshold value {0:?}")]
    NonNumericThresholdValue(String),
    #[error("aggregation method {method} is not supported by {metric_type} metrics")]
    UnsupportedAggregationMethod {
        method: String,
        metric_type: MetricType,
    },
    #[error("no value available for aggregation method {0}")]
    AggregationUnavailable(String),
}
