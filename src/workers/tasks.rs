//! # TaskWorker: the bidirectional task stream of one epoch.
//!
//! ```text
//! loop {
//!   ├─► stream.recv()                ◄── scope cancelled → Ok(())
//!   │     ├─ Err      → LinkError::Stream { Task }
//!   │     └─ Ok(None) → LinkError::StreamClosed { Task }
//!   ├─► executor.execute(task)       (runs to completion)
//!   └─► stream.send(result)          ◄── scope cancelled → Ok(())
//!         └─ Err → LinkError::Stream { Task }
//! }
//! ```
//!
//! ## Rules
//! - One task in flight: result N is sent before receive N+1 starts, so results
//!   leave in the order tasks arrived.
//! - Every result echoes its descriptor's `id` and `type`; an unset `delay` is
//!   filled with the measured execution time.
//! - Execution itself is not interrupted by cancellation; the following send is.
//!   An executor that never returns is aborted by the epoch's drain grace.

use std::sync::Arc;

use tokio::select;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, StreamKind};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::TaskExecutor;
use crate::transport::TaskStream;

pub struct TaskWorker {
    epoch: u64,
    executor: Arc<dyn TaskExecutor>,
    stream: Box<dyn TaskStream>,
    bus: Bus,
}

impl TaskWorker {
    pub fn new(
        epoch: u64,
        executor: Arc<dyn TaskExecutor>,
        stream: Box<dyn TaskStream>,
        bus: Bus,
    ) -> Self {
        Self {
            epoch,
            executor,
            stream,
            bus,
        }
    }

    /// Runs until the scope is cancelled (`Ok`) or the stream fails (`Err`).
    pub async fn run(mut self, scope: CancellationToken) -> Result<(), LinkError> {
        let stream_err = |source| LinkError::Stream {
            stream: StreamKind::Task,
            source,
        };

        loop {
            let received = select! {
                biased;
                _ = scope.cancelled() => return Ok(()),
                r = self.stream.recv() => r,
            };
            let task = match received {
                Ok(Some(task)) => task,
                Ok(None) => {
                    return Err(LinkError::StreamClosed {
                        stream: StreamKind::Task,
                    });
                }
                Err(source) => return Err(stream_err(source)),
            };

            self.bus.publish(
                Event::new(EventKind::TaskReceived)
                    .with_epoch(self.epoch)
                    .with_task(&task),
            );

            let started = Instant::now();
            let mut result = self.executor.execute(task.clone()).await;
            if result.delay == 0.0 {
                result = result.with_delay(started.elapsed());
            }
            result.id = task.id;
            result.kind = task.kind;
            let outcome = if result.successful { "ok" } else { "failed" };

            select! {
                biased;
                _ = scope.cancelled() => return Ok(()),
                sent = self.stream.send(result) => sent.map_err(stream_err)?,
            }

            self.bus.publish(
                Event::new(EventKind::TaskCompleted)
                    .with_epoch(self.epoch)
                    .with_task(&task)
                    .with_reason(outcome),
            );
        }
    }
}
