/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod metric;
pub use metric::Metric;

mod registry;
pub use registry::{Registry, RegistryError};

mod sample;
pub use sample::{Sample, SampleContainer};
