/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[derive(Clone, Debug, Default)]
pub struct RateSink {
    trues: u64,
    total: u64,
}

impl RateSink {
    /// Any non zero value counts as a success.
    pub fn add(&mut self, value: f64) {
        if value != 0.0 {
            self.trues += 1;
        }
        self.total += 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            trues: self.trues,
            total: self.total,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateSnapshot {
    trues: u64,
    total: u64,
}

impl RateSnapshot {
    #[inline]
    pub fn trues(&self) -> u64 {
        self.trues
    }

    #[inline]
    pub fn falses(&self) -> u64 {
        self.total - self.trues
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.trues as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction() {
        let mut sink = RateSink::default();
        assert_eq!(sink.snapshot().rate(), 0.0);

        for _ in 0..3 {
            sink.add(1.0);
        }
        for _ in 0..7 {
            sink.add(0.0);
        }
        let snap = sink.snapshot();
        assert_eq!(snap.rate(), 0.3);
        assert_eq!(snap.trues(), 3);
        assert_eq!(snap.falses(), 7);
    }

    #[test]
    fn non_zero_is_true() {
        let mut sink = RateSink::default();
        sink.add(-1.0);
        sink.add(0.5);
        sink.add(0.0);
        assert_eq!(sink.snapshot().trues(), 2);
    }
}
