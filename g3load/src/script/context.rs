/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use g3_load_types::MetricTagSet;

use crate::metrics::Registry;
use crate::pipeline::SampleSender;

/// What is only available while metrics can still be declared.
pub struct InitEnvironment {
    registry: Registry,
}

impl InitEnvironment {
    pub fn new(registry: Registry) -> Self {
        InitEnvironment { registry }
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VuOptions {
    /// Return invalid `add` values as errors instead of logging them.
    pub throw: bool,
}

/// Per VU state while iterating.
#[derive(Clone)]
pub struct VuState {
    pub options: VuOptions,
    pub sender: SampleSender,
    pub tags: Arc<MetricTagSet>,
    pub logger: slog::Logger,
}

/// The environment VU code runs in.
///
/// During init only `init_env` is set, while iterating only `state` is.
#[derive(Default)]
pub struct VuContext {
    pub init_env: Option<InitEnvironment>,
    pub state: Option<VuState>,
}

impl VuContext {
    pub fn for_init(registry: Registry) -> Self {
        VuContext {
            init_env: Some(InitEnvironment::new(registry)),
            state: None,
        }
    }

    pub fn for_vu(state: VuState) -> Self {
        VuContext {
            init_env: None,
            state: Some(state),
        }
    }

    /// Leave the init phase, no more metric can be declared after this.
    pub fn exit_init(&mut self) -> Option<Registry> {
        self.init_env.take().map(InitEnvironment::into_registry)
    }

    #[inline]
    pub fn is_init(&self) -> bool {
        self.init_env.is_some()
    }
}
