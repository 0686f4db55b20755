/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod values;
pub use values::TrendValues;

mod stats;
pub use stats::TrendStats;

/// Get the value at percentile `pct` (0 to 100) of an ascending sorted slice.
///
/// The rank is `pct / 100 * (n - 1)` and values between two ranks are
/// linearly interpolated. An empty slice gives 0.
pub fn percentile_of_sorted(sorted: &[f64], pct: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 || pct <= 0.0 {
        return sorted[0];
    }
    if pct >= 100.0 {
        return sorted[n - 1];
    }

    let rank = pct / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let lo_v = sorted[lo];
    lo_v + (sorted[hi] - lo_v) * (rank - lo as f64)
}
