/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::ParseError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagName(String);

impl MetricTagName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MetricTagName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(MetricTagName(s.to_string()))
    }
}

impl Borrow<str> for MetricTagName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagValue(String);

impl MetricTagValue {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for MetricTagValue {
    fn from(value: &str) -> Self {
        MetricTagValue(value.to_string())
    }
}

impl From<String> for MetricTagValue {
    fn from(value: String) -> Self {
        MetricTagValue(value)
    }
}

/// Ordered set of tags attached to samples.
///
/// A tag set is never changed in place once it is shared, adding tags always
/// builds a new set and leaves the original one untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagSet {
    inner: BTreeMap<MetricTagName, MetricTagValue>,
}

impl MetricTagSet {
    pub fn new() -> Self {
        MetricTagSet::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(|v| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn with_tag(&self, name: MetricTagName, value: MetricTagValue) -> Self {
        let mut new = self.clone();
        new.inner.insert(name, value);
        new
    }

    /// Merge `other` into a copy of this set, values in `other` win.
    pub fn with_tags(&self, other: &MetricTagSet) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        let mut new = self.clone();
        for (k, v) in &other.inner {
            new.inner.insert(k.clone(), v.clone());
        }
        new
    }

    /// Check whether every tag in `selector` is present here with the same value.
    pub fn contains_all(&self, selector: &MetricTagSet) -> bool {
        selector
            .inner
            .iter()
            .all(|(k, v)| self.inner.get(k).map(|mv| mv == v).unwrap_or(false))
    }
}

impl FromIterator<(MetricTagName, MetricTagValue)> for MetricTagSet {
    fn from_iter<T: IntoIterator<Item = (MetricTagName, MetricTagValue)>>(iter: T) -> Self {
        MetricTagSet {
            inner: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for MetricTagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.inner.iter();
        let Some((name, value)) = iter.next() else {
            return Ok(());
        };
        f.write_str(name.as_str())?;
        f.write_str(":")?;
        f.write_str(value.as_str())?;

        for (name, value) in iter {
            f.write_str(",")?;
            f.write_str(name.as_str())?;
            f.write_str(":")?;
            f.write_str(value.as_str())?;
        }
        Ok(())
    }
}
