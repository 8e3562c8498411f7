//! # LogWriter: session events as structured `tracing` records
//!
//! Installed by default. Connection progress logs at `info`, failures and
//! reconnect scheduling at `warn`, per-task and per-tick traffic at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  agentlink: dialing collector address="collector:5555"
//! WARN  agentlink: dial failed address="collector:5555" label="dial_failed" reason="..."
//! WARN  agentlink: reconnect scheduled attempt=1 delay_ms=5000 label="dial_failed" reason="..."
//! INFO  agentlink: registered with collector receipt=1717171717
//! INFO  agentlink: epoch started epoch=1
//! WARN  agentlink: epoch ended epoch=1 label="stream_failed" reason="state stream failed: ..."
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Renders every [`Event`] through `tracing` under the `agentlink` target.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        let label = e.label.unwrap_or("");
        match e.kind {
            EventKind::Dialing => {
                info!(target: "agentlink", address = e.address.as_deref(), "dialing collector");
            }
            EventKind::Connected => {
                info!(target: "agentlink", address = e.address.as_deref(), "connected to collector");
            }
            EventKind::DialFailed => {
                warn!(target: "agentlink", address = e.address.as_deref(), label, reason, "dial failed");
            }
            EventKind::Registered => {
                info!(target: "agentlink", receipt = e.receipt, "registered with collector");
            }
            EventKind::RegistrationFailed => {
                warn!(target: "agentlink", label, reason, "registration failed");
            }
            EventKind::EpochStarted => {
                info!(target: "agentlink", epoch = e.epoch, "epoch started");
            }
            EventKind::EpochEnded => {
                if e.label.is_some() {
                    warn!(target: "agentlink", epoch = e.epoch, label, reason, "epoch ended");
                } else {
                    info!(target: "agentlink", epoch = e.epoch, "epoch ended");
                }
            }
            EventKind::DrainGraceExceeded => {
                warn!(target: "agentlink", epoch = e.epoch, reason, "stream workers aborted after drain grace");
            }
            EventKind::BackoffScheduled => {
                warn!(
                    target: "agentlink",
                    attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    label,
                    reason,
                    "reconnect scheduled"
                );
            }
            EventKind::RetryCeilingExceeded => {
                error!(
                    target: "agentlink",
                    attempt = e.attempt,
                    "retry ceiling exceeded, collector persistently unreachable; still retrying"
                );
            }
            EventKind::TaskReceived => {
                debug!(target: "agentlink", epoch = e.epoch, task_id = e.task_id, task_type = e.task_kind, "task received");
            }
            EventKind::TaskCompleted => {
                debug!(target: "agentlink", epoch = e.epoch, task_id = e.task_id, task_type = e.task_kind, outcome = reason, "task result sent");
            }
            EventKind::SnapshotSkipped => {
                debug!(target: "agentlink", epoch = e.epoch, "no telemetry snapshot this tick");
            }
            EventKind::ShutdownRequested => {
                info!(target: "agentlink", "shutdown requested");
            }
            EventKind::SupervisorStopped => {
                info!(target: "agentlink", "supervisor stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "agentlink", subscriber = e.subscriber, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "agentlink", subscriber = e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
