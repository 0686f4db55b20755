/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

/// Immutable view of a [`TrendValues`](crate::TrendValues) at some point.
#[derive(Clone, Debug)]
pub struct TrendStats {
    sum: f64,
    min: f64,
    max: f64,
    sorted: Arc<[f64]>,
}

impl TrendStats {
    pub(crate) fn new(sum: f64, min: f64, max: f64, sorted: Arc<[f64]>) -> Self {
        TrendStats {
            sum,
            min,
            max,
            sorted,
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.sorted.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn avg(&self) -> f64 {
        if self.sorted.is_empty() {
            0.0
        } else {
            self.sum / self.sorted.len() as f64
        }
    }

    #[inline]
    pub fn med(&self) -> f64 {
        self.percentile(50.0)
    }

    #[inline]
    pub fn percentile(&self, pct: f64) -> f64 {
        crate::percentile_of_sorted(&self.sorted, pct)
    }
}

#[cfg(test)]
mod tests {
    use crate::TrendValues;

    #[test]
    fn stats() {
        let mut t = TrendValues::with_capacity(100);
        for i in 1..=100 {
            t.add(i as f64);
        }
        let stats = t.stats();
        t.add(1000.0);

        assert_eq!(stats.count(), 100);
        assert_eq!(stats.med(), 50.5);
        assert_eq!(stats.avg(), 50.5);
        assert_eq!(stats.max(), 100.0);
        assert!((stats.percentile(90.0) - 90.1).abs() < 1e-9);
    }
}
