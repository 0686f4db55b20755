/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::debug;

use super::{ScriptError, VuContext};

/// Prefix of every abort message.
pub const ABORT_TEST: &str = "test aborted";

/// Test wide controls available to VU code.
pub struct ExecutionModule;

impl ExecutionModule {
    /// Abort the whole test, from the init context or while iterating.
    ///
    /// The returned error should be propagated out of the VU code as is.
    pub fn abort(ctx: &VuContext, reason: Option<&str>) -> ScriptError {
        let message = match reason {
            Some(r) if !r.is_empty() => format!("{ABORT_TEST}: {r}"),
            _ => ABORT_TEST.to_string(),
        };
        match ctx.state.as_ref() {
            Some(state) => slog::info!(state.logger, "{message}"),
            None => debug!("{message} in the init context"),
        }
        ScriptError::Aborted(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use slog::{Drain, Never, OwnedKVList, Record, o};

    use g3_load_types::MetricTagSet;

    use crate::metrics::Registry;
    use crate::pipeline::SamplePipeline;
    use crate::script::{VuOptions, VuState};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<String>>>);

    impl Drain for Capture {
        type Ok = ();
        type Err = Never;

        fn log(&self, record: &Record, _values: &OwnedKVList) -> Result<(), Never> {
            self.0.lock().unwrap().push(record.msg().to_string());
            Ok(())
        }
    }

    #[test]
    fn abort_in_init() {
        let ctx = VuContext::for_init(Registry::new());
        let e = ExecutionModule::abort(&ctx, None);
        assert!(matches!(&e, ScriptError::Aborted(m) if m == ABORT_TEST));

        let e = ExecutionModule::abort(&ctx, Some(""));
        assert_eq!(e.to_string(), ABORT_TEST);
    }

    #[test]
    fn abort_in_vu() {
        let capture = Capture::default();
        let (sender, _receiver) = SamplePipeline::bounded(1);
        let ctx = VuContext::for_vu(VuState {
            options: VuOptions::default(),
            sender,
            tags: Arc::new(MetricTagSet::default()),
            logger: slog::Logger::root(capture.clone().fuse(), o!()),
        });

        let e = ExecutionModule::abort(&ctx, Some("login failed"));
        assert_eq!(e.to_string(), "test aborted: login failed");
        assert_eq!(
            capture.0.lock().unwrap().as_slice(),
            ["test aborted: login failed"]
        );
    }
}
