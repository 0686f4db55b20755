/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use super::TrendStats;

/// Keeps every value added, so quantiles are exact.
///
/// The sorted view is built lazily and kept until the next `add`.
#[derive(Debug, Default)]
pub struct TrendValues {
    values: Vec<f64>,
    sorted: Option<Arc<[f64]>>,
    sum: f64,
    min: f64,
    max: f64,
}

impl TrendValues {
    pub fn new() -> Self {
        TrendValues::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TrendValues {
            values: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    pub fn add(&mut self, v: f64) {
        if self.values.is_empty() {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.sum += v;
        self.values.push(v);
        self.sorted = None;
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.values.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
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
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    pub fn sorted(&mut self) -> Arc<[f64]> {
        if let Some(sorted) = &self.sorted {
            return Arc::clone(sorted);
        }

        // values only grow at the tail, so the stable sort mostly merges
        // the already sorted prefix with the new run
        self.values.sort_by(f64::total_cmp);
        let sorted: Arc<[f64]> = Arc::from(self.values.as_slice());
        self.sorted = Some(Arc::clone(&sorted));
        sorted
    }

    pub fn percentile(&mut self, pct: f64) -> f64 {
        let sorted = self.sorted();
        crate::percentile_of_sorted(&sorted, pct)
    }

    pub fn stats(&mut self) -> TrendStats {
        TrendStats::new(self.sum, self.min, self.max, self.sorted())
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.sorted = None;
        self.sum = 0.0;
        self.min = 0.0;
        self.max = 0.0;
    }
}
