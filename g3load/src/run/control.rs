/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::info;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use g3_load_types::MetricKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbortReason {
    ThresholdBreached { key: MetricKey, threshold: String },
    ScriptException(String),
    ScriptAbort(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::ThresholdBreached { key, threshold } => {
                write!(f, "threshold '{threshold}' of metric '{key}' has failed")
            }
            AbortReason::ScriptException(e) => write!(f, "script exception: {e}"),
            AbortReason::ScriptAbort(message) => f.write_str(message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Running,
    Stopping,
    Finished,
}

/// Shared stop switch of a run.
///
/// Everything that loops during a run watches the same cancellation token.
/// Only the first abort reason is kept.
#[derive(Clone, Default)]
pub struct RunControl {
    cancel: CancellationToken,
    reason: Arc<ArcSwapOption<AbortReason>>,
}

impl RunControl {
    pub fn new() -> Self {
        RunControl::default()
    }

    /// Abort the run, returns false if it has been aborted already.
    pub fn abort(&self, reason: AbortReason) -> bool {
        let prev = self
            .reason
            .compare_and_swap(&None::<Arc<AbortReason>>, Some(Arc::new(reason)));
        if prev.is_some() {
            return false;
        }
        if let Some(reason) = self.reason.load().as_ref() {
            info!("run aborted: {reason}");
        }
        self.cancel.cancel();
        true
    }

    /// Stop the run normally.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn abort_reason(&self) -> Option<Arc<AbortReason>> {
        self.reason.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn breached(threshold: &str) -> AbortReason {
        AbortReason::ThresholdBreached {
            key: MetricKey::from_str("checks").unwrap(),
            threshold: threshold.to_string(),
        }
    }

    #[test]
    fn first_abort_wins() {
        let control = RunControl::new();
        assert!(!control.is_cancelled());
        assert!(control.abort_reason().is_none());

        assert!(control.abort(breached("rate>0.9")));
        assert!(!control.abort(breached("rate>0.5")));
        assert!(control.is_cancelled());
        assert_eq!(control.abort_reason().as_deref(), Some(&breached("rate>0.9")));
    }

    #[test]
    fn stop_has_no_reason() {
        let control = RunControl::new();
        let cloned = control.clone();
        cloned.stop();
        assert!(control.is_cancelled());
        assert!(control.abort_reason().is_none());
    }

    #[tokio::test]
    async fn wait_cancelled() {
        let control = RunControl::new();
        let cloned = control.clone();
        let task = tokio::spawn(async move {
            cloned.cancelled().await;
        });
        control.abort(AbortReason::ScriptException("boom".to_string()));
        task.await.unwrap();
    }
}
