/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metrics::SampleContainer;
use crate::pipeline::SampleReceiver;

mod snapshot;
pub use snapshot::{MetricSnapshot, RegistrySnapshot};

mod table;
pub use table::SinkTable;

const BATCH_SIZE: usize = 128;
const COMMAND_CHANNEL_SIZE: usize = 16;

enum Command {
    Snapshot(oneshot::Sender<Arc<RegistrySnapshot>>),
}

#[derive(Clone)]
pub struct AggregatorHandle {
    cmd_sender: mpsc::Sender<Command>,
}

impl AggregatorHandle {
    /// Ask the aggregator for a snapshot of all sinks.
    ///
    /// Returns `None` once the aggregator has stopped.
    pub async fn snapshot(&self) -> Option<Arc<RegistrySnapshot>> {
        let (sender, receiver) = oneshot::channel();
        self.cmd_sender
            .send(Command::Snapshot(sender))
            .await
            .ok()?;
        receiver.await.ok()
    }
}

/// The single consumer of the sample pipeline and the only writer of the sinks.
pub struct Aggregator {
    receiver: SampleReceiver,
    cmd_receiver: mpsc::Receiver<Command>,
    table: SinkTable,
    started: Instant,
}

impl Aggregator {
    pub fn new(
        table: SinkTable,
        receiver: SampleReceiver,
        started: Instant,
    ) -> (Self, AggregatorHandle) {
        let (cmd_sender, cmd_receiver) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let aggregator = Aggregator {
            receiver,
            cmd_receiver,
            table,
            started,
        };
        (aggregator, AggregatorHandle { cmd_sender })
    }

    /// Fold samples until cancelled or until all producers are gone.
    ///
    /// On cancellation the pipeline is closed and what is still buffered
    /// is drained before the sink table is returned.
    pub async fn into_running(mut self, cancel: CancellationToken) -> SinkTable {
        let mut buffer = Vec::with_capacity(BATCH_SIZE);
        let mut cmd_closed = false;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                cmd = self.cmd_receiver.recv(), if !cmd_closed => {
                    match cmd {
                        Some(cmd) => self.handle_cmd(cmd),
                        None => cmd_closed = true,
                    }
                }
                nr = self.receiver.recv_many(&mut buffer, BATCH_SIZE) => {
                    if nr == 0 {
                        debug!("all sample producers are gone");
                        return self.table;
                    }
                    self.handle_samples(&mut buffer);
                }
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        loop {
            let nr = self.receiver.recv_many(&mut buffer, BATCH_SIZE).await;
            if nr == 0 {
                break;
            }
            drained += nr;
            self.handle_samples(&mut buffer);
        }
        debug!("aggregator stopped, {drained} buffered containers drained");
        self.table
    }

    fn handle_cmd(&mut self, cmd: Command) {
        match cmd {
            Command::Snapshot(sender) => {
                let snapshot = self.table.snapshot(self.started.elapsed());
                trace!("snapshot taken with {} entries", snapshot.len());
                let _ = sender.send(Arc::new(snapshot));
            }
        }
    }

    fn handle_samples(&mut self, buffer: &mut Vec<SampleContainer>) {
        for container in buffer.drain(..) {
            for sample in container.samples() {
                self.table.add(sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    use g3_load_types::{MetricKey, MetricTagSet, MetricType, ValueType};
    use g3_threshold::AggregationMethod;

    use crate::metrics::{Registry, Sample};
    use crate::pipeline::SamplePipeline;

    #[tokio::test]
    async fn drain_on_cancel() {
        let mut registry = Registry::new();
        let metric = registry
            .get_or_new("iterations", MetricType::Counter, ValueType::Default)
            .unwrap();
        let table = SinkTable::new(registry.take_sinks(), Vec::new());
        let (sender, receiver) = SamplePipeline::bounded(64);
        let (aggregator, _handle) = Aggregator::new(table, receiver, Instant::now());

        let tags = Arc::new(MetricTagSet::new());
        for _ in 0..10 {
            sender
                .push(Sample::new(metric.clone(), 1.0, tags.clone()).into())
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut table = aggregator.into_running(cancel).await;

        let snapshot = table.snapshot(Duration::from_secs(1));
        let m = snapshot
            .get(&MetricKey::from_str("iterations").unwrap())
            .unwrap();
        assert_eq!(
            m.sink.aggregate(&AggregationMethod::Count, Duration::ZERO),
            Some(10.0)
        );
        assert!(sender.push(Sample::new(metric, 1.0, tags).into()).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_while_running() {
        let mut registry = Registry::new();
        let metric = registry
            .get_or_new("vus", MetricType::Gauge, ValueType::Default)
            .unwrap();
        let table = SinkTable::new(registry.take_sinks(), Vec::new());
        let (sender, receiver) = SamplePipeline::bounded(64);
        let (aggregator, handle) = Aggregator::new(table, receiver, Instant::now());

        let cancel = CancellationToken::new();
        let task = tokio::spawn(aggregator.into_running(cancel.clone()));

        let tags = Arc::new(MetricTagSet::new());
        sender
            .push(Sample::new(metric.clone(), 3.0, tags.clone()).into())
            .await
            .unwrap();

        let key = MetricKey::from_str("vus").unwrap();
        let mut value = None;
        for _ in 0..100 {
            let snapshot = handle.snapshot().await.unwrap();
            if let Some(m) = snapshot.get(&key)
                && !m.sink.is_empty()
            {
                value = m.sink.aggregate(&AggregationMethod::Value, Duration::ZERO);
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(value, Some(3.0));

        cancel.cancel();
        let _table = task.await.unwrap();
        assert!(handle.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn stop_without_producers() {
        let registry_sinks = Registry::new().take_sinks();
        let (sender, receiver) = SamplePipeline::bounded(4);
        let (aggregator, _handle) =
            Aggregator::new(SinkTable::new(registry_sinks, Vec::new()), receiver, Instant::now());
        drop(sender);
        let table = aggregator.into_running(CancellationToken::new()).await;
        assert!(table.is_empty());
    }
}
