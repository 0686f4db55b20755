/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Bounded fan-in channel from the VUs to the aggregator.
//!
//! Producers are suspended when the pipeline is full, samples are never
//! dropped. After [`SampleReceiver::close`] no new container is accepted,
//! but the buffered ones can still be drained.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::metrics::SampleContainer;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    #[error("sample pipeline closed")]
    Closed,
}

#[derive(Debug)]
pub enum TryPushError {
    Full(SampleContainer),
    Closed(SampleContainer),
}

pub struct SamplePipeline;

impl SamplePipeline {
    pub fn bounded(capacity: usize) -> (SampleSender, SampleReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (SampleSender { inner: sender }, SampleReceiver { inner: receiver })
    }
}

#[derive(Clone)]
pub struct SampleSender {
    inner: mpsc::Sender<SampleContainer>,
}

impl SampleSender {
    /// Wait for capacity and enqueue the container.
    pub async fn push(&self, container: SampleContainer) -> Result<(), PipelineError> {
        self.inner
            .send(container)
            .await
            .map_err(|_| PipelineError::Closed)
    }

    pub fn try_push(&self, container: SampleContainer) -> Result<(), TryPushError> {
        use mpsc::error::TrySendError;

        self.inner.try_send(container).map_err(|e| match e {
            TrySendError::Full(c) => TryPushError::Full(c),
            TrySendError::Closed(c) => TryPushError::Closed(c),
        })
    }
}

pub struct SampleReceiver {
    inner: mpsc::Receiver<SampleContainer>,
}

impl SampleReceiver {
    /// Receive up to `limit` containers into `buf`.
    ///
    /// Returns 0 only if the pipeline is closed, or all senders are gone,
    /// and nothing is buffered any more.
    pub async fn recv_many(&mut self, buf: &mut Vec<SampleContainer>, limit: usize) -> usize {
        self.inner.recv_many(buf, limit).await
    }

    pub async fn recv(&mut self) -> Option<SampleContainer> {
        self.inner.recv().await
    }

    pub fn close(&mut self) {
        self.inner.close();
    }

    /// Number of containers waiting in the pipeline.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
