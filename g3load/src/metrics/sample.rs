/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};

use g3_load_types::MetricTagSet;

use super::Metric;

/// One measured value.
#[derive(Clone, Debug)]
pub struct Sample {
    pub metric: Arc<Metric>,
    pub value: f64,
    pub time: DateTime<Utc>,
    pub tags: Arc<MetricTagSet>,
}

impl Sample {
    pub fn new(metric: Arc<Metric>, value: f64, tags: Arc<MetricTagSet>) -> Self {
        Sample {
            metric,
            value,
            time: Utc::now(),
            tags,
        }
    }
}

/// The unit that travels through the sample pipeline.
#[derive(Clone, Debug)]
pub enum SampleContainer {
    Single(Sample),
    Batch(Vec<Sample>),
}

impl SampleContainer {
    pub fn samples(&self) -> &[Sample] {
        match self {
            SampleContainer::Single(s) => std::slice::from_ref(s),
            SampleContainer::Batch(v) => v.as_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }
}

impl From<Sample> for SampleContainer {
    fn from(value: Sample) -> Self {
        SampleContainer::Single(value)
    }
}

impl From<Vec<Sample>> for SampleContainer {
    fn from(value: Vec<Sample>) -> Self {
        SampleContainer::Batch(value)
    }
}
