/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{Arguments, Write as _};
use std::io::{self, Write};

use chrono::Local;
use slog::{Drain, KV, Level, Never, OwnedKVList, Record, Serializer, o};
use slog_scope::GlobalLoggerGuard;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Line based drain to stderr: `<time> <level> key: value, ... <message>`.
pub struct StderrDrain {
    min_level: Level,
}

impl StderrDrain {
    pub fn new(min_level: Level) -> Self {
        StderrDrain { min_level }
    }
}

impl Drain for StderrDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, values: &OwnedKVList) -> Result<(), Never> {
        if !record.level().is_at_least(self.min_level) {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(256);
        if write_plain(&mut buf, record, values).is_ok() {
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(&buf);
            let _ = stderr.flush();
        }
        Ok(())
    }
}

fn write_plain<W: Write>(w: &mut W, record: &Record, values: &OwnedKVList) -> io::Result<()> {
    let mut kv_pairs = Vec::new();
    let mut collector = KvCollector(&mut kv_pairs);
    let _ = values.serialize(record, &mut collector);
    let _ = record.kv().serialize(record, &mut collector);

    write!(w, "{} {}", Local::now().format(TIME_FORMAT), record.level())?;
    for (k, v) in &kv_pairs {
        write!(w, " {k}: {v},")?;
    }
    writeln!(w, " {}", record.msg())
}

struct KvCollector<'a>(&'a mut Vec<(String, String)>);

impl Serializer for KvCollector<'_> {
    fn emit_usize(&mut self, key: slog::Key, value: usize) -> slog::Result {
        let mut buffer = itoa::Buffer::new();
        self.emit_str(key, buffer.format(value))
    }

    fn emit_str(&mut self, key: slog::Key, value: &str) -> slog::Result {
        let k: &str = key.as_ref();
        self.0.push((k.to_string(), value.to_string()));
        Ok(())
    }

    fn emit_arguments(&mut self, key: slog::Key, value: &Arguments) -> slog::Result {
        if let Some(s) = value.as_str() {
            return self.emit_str(key, s);
        }
        let mut s = String::new();
        let _ = s.write_fmt(*value);
        self.emit_str(key, &s)
    }
}

fn verbose_level(verbose: u8) -> (Level, log::Level) {
    match verbose {
        0 => (Level::Warning, log::Level::Warn),
        1 => (Level::Info, log::Level::Info),
        2 => (Level::Debug, log::Level::Debug),
        _ => (Level::Trace, log::Level::Trace),
    }
}

/// Install the process logger, the returned guard must be held until exit.
pub fn setup(verbose: u8) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let (level, log_level) = verbose_level(verbose);
    let drain = StderrDrain::new(level);
    let logger = slog::Logger::root(drain.fuse(), o!());

    let scope_guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(log_level)?;
    Ok(scope_guard)
}
