/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[derive(Clone, Debug, Default)]
pub struct GaugeSink {
    last: f64,
    min: f64,
    max: f64,
    count: u64,
}

impl GaugeSink {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.last = value;
        self.count += 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            value: self.last,
            min: self.min,
            max: self.max,
            count: self.count,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GaugeSnapshot {
    value: f64,
    min: f64,
    max: f64,
    count: u64,
}

impl GaugeSnapshot {
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_min_max() {
        let mut sink = GaugeSink::default();
        for v in [5.0, -2.0, 9.0, 3.0] {
            sink.add(v);
        }
        let snap = sink.snapshot();
        assert_eq!(snap.value(), 3.0);
        assert_eq!(snap.min(), -2.0);
        assert_eq!(snap.max(), 9.0);
    }

    #[test]
    fn first_value_sets_bounds() {
        let mut sink = GaugeSink::default();
        sink.add(7.0);
        let snap = sink.snapshot();
        assert_eq!(snap.min(), 7.0);
        assert_eq!(snap.max(), 7.0);
    }
}
