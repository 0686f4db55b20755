/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use super::{AbortReason, RunErrorKind};
use crate::aggregate::RegistrySnapshot;
use crate::threshold::ThresholdSet;

/// What is left after a run has finished.
pub struct RunOutcome {
    pub duration: Duration,
    pub iterations: usize,
    /// Iterations cut short by the end of the run.
    pub interrupted: usize,
    pub aborted: Option<Arc<AbortReason>>,
    pub thresholds: ThresholdSet,
    pub snapshot: RegistrySnapshot,
}

impl RunOutcome {
    /// The failure class of this run, `None` means success.
    pub fn exit_class(&self) -> Option<RunErrorKind> {
        match self.aborted.as_deref() {
            Some(AbortReason::ThresholdBreached { .. } | AbortReason::ScriptAbort(_)) => {
                Some(RunErrorKind::ScriptAborted)
            }
            Some(AbortReason::ScriptException(_)) => Some(RunErrorKind::ScriptException),
            None if self.thresholds.has_failed() => Some(RunErrorKind::ThresholdsFailed),
            None => None,
        }
    }

    pub fn summary(&self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.write_summary(&mut stdout)?;
        stdout.flush()
    }

    pub fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "Duration: {:.3?}", self.duration)?;
        writeln!(w, "Iterations: {}", self.iterations)?;
        if self.interrupted > 0 {
            writeln!(w, "Interrupted: {}", self.interrupted)?;
        }
        if let Some(reason) = &self.aborted {
            writeln!(w, "Aborted: {reason}")?;
        }

        let keys: Vec<String> = self.snapshot.iter().map(|(k, _)| k.to_string()).collect();
        let width = keys.iter().map(|k| k.len()).max().unwrap_or_default();
        if !keys.is_empty() {
            writeln!(w)?;
            writeln!(w, "Metrics:")?;
        }
        for (key, (_, entry)) in keys.iter().zip(self.snapshot.iter()) {
            if entry.sink.is_empty() {
                writeln!(w, "  {key:<width$}  no sample")?;
            } else {
                let view = entry.view(self.snapshot.elapsed());
                writeln!(w, "  {key:<width$}  {view}")?;
            }
        }

        if !self.thresholds.is_empty() {
            writeln!(w)?;
            writeln!(w, "Thresholds:")?;
            for m in self.thresholds.iter() {
                for state in m.thresholds() {
                    let mark = if !state.evaluated() {
                        '-'
                    } else if state.last_failed() {
                        '\u{2717}'
                    } else {
                        '\u{2713}'
                    };
                    writeln!(w, "  {mark} {} '{}'", m.key(), state.threshold().source())?;
                }
            }
        }
        Ok(())
    }
}
