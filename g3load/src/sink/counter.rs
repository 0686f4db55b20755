/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct CounterSink {
    sum: f64,
    count: u64,
}

impl CounterSink {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            sum: self.sum,
            count: self.count,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CounterSnapshot {
    sum: f64,
    count: u64,
}

impl CounterSnapshot {
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of samples folded, not the counter value.
    #[inline]
    pub fn samples(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sum per second over `elapsed`.
    pub fn rate(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 { self.sum / secs } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_and_rate() {
        let mut sink = CounterSink::default();
        assert!(sink.is_empty());
        for v in [1.0, 2.0, 3.0, 4.0] {
            sink.add(v);
        }
        let snap = sink.snapshot();
        assert_eq!(snap.sum(), 10.0);
        assert_eq!(snap.samples(), 4);
        assert_eq!(snap.rate(Duration::from_secs(5)), 2.0);
        assert_eq!(snap.rate(Duration::ZERO), 0.0);
    }
}
