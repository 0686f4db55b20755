/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Per metric aggregation state.
//!
//! Sinks are only mutated by the aggregator. Readers get a [`SinkSnapshot`],
//! which is a self consistent copy taken between two sample batches.

use std::fmt;
use std::time::Duration;

use g3_load_types::{MetricType, ValueType};
use g3_threshold::{AggregateSource, AggregationMethod};
use g3_trend::TrendStats;

use crate::metrics::Sample;

mod counter;
pub use counter::{CounterSink, CounterSnapshot};

mod gauge;
pub use gauge::{GaugeSink, GaugeSnapshot};

mod trend;
pub use trend::TrendSink;

mod rate;
pub use rate::{RateSink, RateSnapshot};

const SUMMARY_PERCENTILES: [f64; 2] = [90.0, 95.0];

#[derive(Debug)]
pub enum Sink {
    Counter(CounterSink),
    Gauge(GaugeSink),
    Trend(TrendSink),
    Rate(RateSink),
}

impl Sink {
    pub fn new(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Counter => Sink::Counter(CounterSink::default()),
            MetricType::Gauge => Sink::Gauge(GaugeSink::default()),
            MetricType::Trend => Sink::Trend(TrendSink::default()),
            MetricType::Rate => Sink::Rate(RateSink::default()),
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            Sink::Counter(_) => MetricType::Counter,
            Sink::Gauge(_) => MetricType::Gauge,
            Sink::Trend(_) => MetricType::Trend,
            Sink::Rate(_) => MetricType::Rate,
        }
    }

    /// Fold one sample in. Only the value is aggregated, the time and the tags
    /// have already been used to select this sink.
    pub fn add(&mut self, sample: &Sample) {
        match self {
            Sink::Counter(s) => s.add(sample.value),
            Sink::Gauge(s) => s.add(sample.value),
            Sink::Trend(s) => s.add(sample.value),
            Sink::Rate(s) => s.add(sample.value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Sink::Counter(s) => s.is_empty(),
            Sink::Gauge(s) => s.is_empty(),
            Sink::Trend(s) => s.is_empty(),
            Sink::Rate(s) => s.is_empty(),
        }
    }

    pub fn snapshot(&mut self) -> SinkSnapshot {
        match self {
            Sink::Counter(s) => SinkSnapshot::Counter(s.snapshot()),
            Sink::Gauge(s) => SinkSnapshot::Gauge(s.snapshot()),
            Sink::Trend(s) => SinkSnapshot::Trend(s.snapshot()),
            Sink::Rate(s) => SinkSnapshot::Rate(s.snapshot()),
        }
    }
}

#[derive(Clone, Debug)]
pub enum SinkSnapshot {
    Counter(CounterSnapshot),
    Gauge(GaugeSnapshot),
    Trend(TrendStats),
    Rate(RateSnapshot),
}

impl SinkSnapshot {
    pub fn metric_type(&self) -> MetricType {
        match self {
            SinkSnapshot::Counter(_) => MetricType::Counter,
            SinkSnapshot::Gauge(_) => MetricType::Gauge,
            SinkSnapshot::Trend(_) => MetricType::Trend,
            SinkSnapshot::Rate(_) => MetricType::Rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SinkSnapshot::Counter(s) => s.is_empty(),
            SinkSnapshot::Gauge(s) => s.is_empty(),
            SinkSnapshot::Trend(s) => s.is_empty(),
            SinkSnapshot::Rate(s) => s.is_empty(),
        }
    }

    /// Resolve an aggregation method, `None` if this type has no such value.
    ///
    /// `elapsed` is the run time the counter rate is computed over.
    pub fn aggregate(&self, method: &AggregationMethod, elapsed: Duration) -> Option<f64> {
        match (self, method) {
            (SinkSnapshot::Counter(s), AggregationMethod::Count) => Some(s.sum()),
            (SinkSnapshot::Counter(s), AggregationMethod::Rate) => Some(s.rate(elapsed)),
            (SinkSnapshot::Gauge(s), AggregationMethod::Value) => Some(s.value()),
            (SinkSnapshot::Gauge(s), AggregationMethod::Min) => Some(s.min()),
            (SinkSnapshot::Gauge(s), AggregationMethod::Max) => Some(s.max()),
            (SinkSnapshot::Trend(s), AggregationMethod::Count) => Some(s.count() as f64),
            (SinkSnapshot::Trend(s), AggregationMethod::Avg) => Some(s.avg()),
            (SinkSnapshot::Trend(s), AggregationMethod::Min) => Some(s.min()),
            (SinkSnapshot::Trend(s), AggregationMethod::Max) => Some(s.max()),
            (SinkSnapshot::Trend(s), AggregationMethod::Med) => Some(s.med()),
            (SinkSnapshot::Trend(s), AggregationMethod::Percentile { pct, .. }) => {
                Some(s.percentile(*pct))
            }
            (SinkSnapshot::Rate(s), AggregationMethod::Rate) => Some(s.rate()),
            _ => None,
        }
    }

    pub fn view(&self, value_type: ValueType, elapsed: Duration) -> SinkView<'_> {
        SinkView {
            snapshot: self,
            value_type,
            elapsed,
        }
    }
}

/// A snapshot bound to the run time, usable as a threshold source and for
/// the summary line.
pub struct SinkView<'a> {
    snapshot: &'a SinkSnapshot,
    value_type: ValueType,
    elapsed: Duration,
}

impl AggregateSource for SinkView<'_> {
    fn aggregate(&self, method: &AggregationMethod) -> Option<f64> {
        self.snapshot.aggregate(method, self.elapsed)
    }
}

struct Value(f64, ValueType);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            ValueType::Time => write!(f, "{:.2}ms", self.0),
            ValueType::Default => {
                if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
                    let mut buffer = itoa::Buffer::new();
                    f.write_str(buffer.format(self.0 as i64))
                } else {
                    write!(f, "{:.4}", self.0)
                }
            }
        }
    }
}

impl fmt::Display for SinkView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vt = self.value_type;
        match self.snapshot {
            SinkSnapshot::Counter(s) => write!(
                f,
                "count={} rate={:.2}/s",
                Value(s.sum(), vt),
                s.rate(self.elapsed)
            ),
            SinkSnapshot::Gauge(s) => write!(
                f,
                "value={} min={} max={}",
                Value(s.value(), vt),
                Value(s.min(), vt),
                Value(s.max(), vt)
            ),
            SinkSnapshot::Trend(s) => {
                write!(
                    f,
                    "avg={} min={} med={} max={}",
                    Value(s.avg(), vt),
                    Value(s.min(), vt),
                    Value(s.med(), vt),
                    Value(s.max(), vt)
                )?;
                for pct in SUMMARY_PERCENTILES {
                    write!(f, " p({pct})={}", Value(s.percentile(pct), vt))?;
                }
                Ok(())
            }
            SinkSnapshot::Rate(s) => write!(
                f,
                "rate={:.2}% \u{2713} {} \u{2717} {}",
                s.rate() * 100.0,
                s.trues(),
                s.falses()
            ),
        }
    }
}
