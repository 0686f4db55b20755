/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_trend::{TrendStats, TrendValues};

const INITIAL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct TrendSink {
    values: TrendValues,
}

impl Default for TrendSink {
    fn default() -> Self {
        TrendSink {
            values: TrendValues::with_capacity(INITIAL_CAPACITY),
        }
    }
}

impl TrendSink {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.values.add(value);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The sorted values are shared with the snapshot, not copied again
    /// until new values arrive.
    pub fn snapshot(&mut self) -> TrendStats {
        self.values.stats()
    }
}
