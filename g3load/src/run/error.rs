/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunErrorKind {
    InvalidConfig,
    ScriptException,
    ScriptAborted,
    ThresholdsFailed,
}

impl RunErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RunErrorKind::InvalidConfig => "invalid config",
            RunErrorKind::ScriptException => "script exception",
            RunErrorKind::ScriptAborted => "script aborted",
            RunErrorKind::ThresholdsFailed => "thresholds have failed",
        }
    }
}

impl fmt::Display for RunErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified run failure.
///
/// It is usually carried inside an `anyhow::Error` chain and looked up by
/// `downcast_ref` where the exit status is decided.
#[derive(Debug)]
pub struct RunError {
    kind: RunErrorKind,
    source: anyhow::Error,
}

impl RunError {
    pub fn new<E>(kind: RunErrorKind, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        RunError {
            kind,
            source: source.into(),
        }
    }

    pub fn invalid_config<E: Into<anyhow::Error>>(source: E) -> Self {
        RunError::new(RunErrorKind::InvalidConfig, source)
    }

    pub fn script_exception<E: Into<anyhow::Error>>(source: E) -> Self {
        RunError::new(RunErrorKind::ScriptException, source)
    }

    #[inline]
    pub fn kind(&self) -> RunErrorKind {
        self.kind
    }

    /// Find the classification of an error chain, if there is any.
    pub fn classify(e: &anyhow::Error) -> Option<RunErrorKind> {
        e.chain()
            .find_map(|e| e.downcast_ref::<RunError>())
            .map(|e| e.kind)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn classify_in_chain() {
        let e: anyhow::Result<()> = Err(RunError::invalid_config(anyhow!("bad")).into());
        let e = e.context("failed to prepare the run").unwrap_err();
        assert_eq!(RunError::classify(&e), Some(RunErrorKind::InvalidConfig));
        assert_eq!(
            format!("{e:#}"),
            "failed to prepare the run: invalid config: bad"
        );

        let e = anyhow!("io error");
        assert_eq!(RunError::classify(&e), None);
    }
}
