/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod set;
pub use set::{AbortRequest, Evaluation, MetricThresholds, ThresholdSet, ThresholdState};

mod evaluator;
pub use evaluator::{EvaluatorState, ThresholdEvaluator};
