/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThresholdOperator {
    LessEqual,
    Less,
    GreaterEqual,
    Greater,
    StrictEqual,
    Equal,
    NotEqual,
}

impl ThresholdOperator {
    /// Operators in the order they are searched for in an expression.
    ///
    /// Longer operators come before their prefixes, so `<=` is never read as `<`
    /// and `===` is never read as `==`.
    pub const SCAN_ORDER: [ThresholdOperator; 7] = [
        ThresholdOperator::LessEqual,
        ThresholdOperator::Less,
        ThresholdOperator::GreaterEqual,
        ThresholdOperator::Greater,
        ThresholdOperator::StrictEqual,
        ThresholdOperator::Equal,
        ThresholdOperator::NotEqual,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ThresholdOperator::LessEqual => "<=",
            ThresholdOperator::Less => "<",
            ThresholdOperator::GreaterEqual => ">=",
            ThresholdOperator::Greater => ">",
            ThresholdOperator::StrictEqual => "===",
            ThresholdOperator::Equal => "==",
            ThresholdOperator::NotEqual => "!=",
        }
    }

    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ThresholdOperator::LessEqual => lhs <= rhs,
            ThresholdOperator::Less => lhs < rhs,
            ThresholdOperator::GreaterEqual => lhs >= rhs,
            ThresholdOperator::Greater => lhs > rhs,
            ThresholdOperator::StrictEqual | ThresholdOperator::Equal => lhs == rhs,
            ThresholdOperator::NotEqual => lhs != rhs,
        }
    }
}

impl fmt::Display for ThresholdOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare() {
        assert!(ThresholdOperator::Less.compare(1.0, 2.0));
        assert!(!ThresholdOperator::Less.compare(2.0, 2.0));
        assert!(ThresholdOperator::LessEqual.compare(2.0, 2.0));
        assert!(ThresholdOperator::Greater.compare(3.0, 2.0));
        assert!(ThresholdOperator::GreaterEqual.compare(2.0, 2.0));
        assert!(ThresholdOperator::Equal.compare(2.0, 2.0));
        assert!(ThresholdOperator::StrictEqual.compare(2.0, 2.0));
        assert!(ThresholdOperator::NotEqual.compare(2.0, 2.5));
        assert!(!ThresholdOperator::NotEqual.compare(2.0, 2.0));
    }
}
