//! # TelemetryWorker: the outbound state stream of one epoch.
//!
//! ```text
//! loop {
//!   ├─► wait tick (interval)        ◄── scope cancelled → Ok(())
//!   ├─► source.snapshot()
//!   │     └─ None → SnapshotSkipped, next tick (nothing queued)
//!   └─► sink.send(snapshot)         ◄── scope cancelled → Ok(())
//!         └─ Err → LinkError::Stream { State }  (ends the epoch)
//! }
//! ```
//!
//! ## Rules
//! - The first tick fires immediately; missed ticks are skipped, never burst.
//! - A failed send is not retried: losing one snapshot is acceptable, losing the
//!   stream is the supervisor's problem.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, StreamKind};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::SnapshotSource;
use crate::transport::StateSink;

pub struct TelemetryWorker {
    epoch: u64,
    interval: Duration,
    source: Arc<dyn SnapshotSource>,
    sink: Box<dyn StateSink>,
    bus: Bus,
}

impl TelemetryWorker {
    pub fn new(
        epoch: u64,
        interval: Duration,
        source: Arc<dyn SnapshotSource>,
        sink: Box<dyn StateSink>,
        bus: Bus,
    ) -> Self {
        Self {
            epoch,
            interval,
            source,
            sink,
            bus,
        }
    }

    /// Runs until the scope is cancelled (`Ok`) or a send fails (`Err`).
    pub async fn run(mut self, scope: CancellationToken) -> Result<(), LinkError> {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            select! {
                biased;
                _ = scope.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let Some(snapshot) = self.source.snapshot() else {
                self.bus
                    .publish(Event::new(EventKind::SnapshotSkipped).with_epoch(self.epoch));
                continue;
            };

            select! {
                biased;
                _ = scope.cancelled() => return Ok(()),
                sent = self.sink.send(snapshot) => {
                    sent.map_err(|source| LinkError::Stream { stream: StreamKind::State, source })?;
                }
            }
        }
    }
}
