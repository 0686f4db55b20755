/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod aggregate;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod run;
pub mod script;
pub mod sink;
pub mod threshold;

pub mod build;
pub mod log;
pub mod opts;
