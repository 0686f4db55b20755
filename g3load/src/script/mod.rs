/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! The metric API exposed to VU code: declaring metrics during init and
//! adding samples while iterating.

use thiserror::Error;

use g3_load_types::MetricName;

use crate::metrics::RegistryError;
use crate::pipeline::PipelineError;

mod value;
pub use value::{ScriptObject, ScriptValue};

mod context;
pub use context::{InitEnvironment, VuContext, VuOptions, VuState};

mod module;
pub use module::{MetricHandle, MetricsModule};

mod execution;
pub use execution::{ABORT_TEST, ExecutionModule};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("metrics must be declared in the init context")]
    DeclarationOutOfPhase,
    #[error("metrics can only be added from a VU context")]
    NoVuState,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(
        "'{value}' is an invalid value for metric '{metric}', \
         a number or a boolean value is expected"
    )]
    InvalidValue { metric: MetricName, value: String },
    #[error("no value was provided for metric '{0}'")]
    NoValue(MetricName),
    #[error("invalid tag name {0:?} for metric '{1}'")]
    InvalidTagName(String, MetricName),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("{0}")]
    Aborted(String),
}
