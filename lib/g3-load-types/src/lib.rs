/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

mod name;
pub use name::MetricName;

mod kind;
pub use kind::{MetricType, ValueType};

mod tag;
pub use tag::{MetricTagName, MetricTagSet, MetricTagValue};

mod key;
pub use key::MetricKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty string")]
    Empty,
    #[error("too long ({0} bytes), at most 128 is allowed")]
    TooLong(usize),
    #[error("invalid leading char: {0:?}")]
    InvalidLeadingChar(char),
    #[error("invalid char: {0:?}")]
    InvalidChar(char),
    #[error("unknown metric type {0}")]
    UnknownMetricType(String),
    #[error("invalid tag selector: {0}")]
    InvalidSelector(&'static str),
}

const MAX_NAME_LEN: usize = 128;

fn check_identifier(s: &str) -> Result<(), ParseError> {
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    if s.len() > MAX_NAME_LEN {
        return Err(ParseError::TooLong(s.len()));
    }

    let mut chars = s.chars();
    if let Some(c) = chars.next() {
        if !(c.is_ascii_alphabetic() || c == '_') {
            return Err(ParseError::InvalidLeadingChar(c));
        }
    }
    for c in chars {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {}
            _ => return Err(ParseError::InvalidChar(c)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier() {
        assert!(check_identifier("http_req_duration").is_ok());
        assert!(check_identifier("_private1").is_ok());
        assert_eq!(check_identifier(""), Err(ParseError::Empty));
        assert_eq!(
            check_identifier("1abc"),
            Err(ParseError::InvalidLeadingChar('1'))
        );
        assert_eq!(check_identifier("a-b"), Err(ParseError::InvalidChar('-')));
        assert_eq!(
            check_identifier(&"a".repeat(129)),
            Err(ParseError::TooLong(129))
        );
    }
}
