//! # Session lifecycle events.
//!
//! The [`EventKind`] enum classifies events in four groups:
//! - **Connection events**: dialing, registration, epoch start/end
//! - **Retry events**: backoff scheduling, retry ceiling crossing
//! - **Stream events**: task received/completed, skipped telemetry ticks
//! - **Runtime events**: shutdown, subscriber overflow/panic
//!
//! The [`Event`] struct carries optional metadata (epoch id, attempt, delay,
//! reason...) depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use agentlink::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(10))
//!     .with_reason("dial collector:5555 failed: connection refused");
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay_ms, Some(10_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::LinkError;
use crate::model::TaskDescriptor;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection events ===
    /// Dial attempt started.
    ///
    /// Sets: `address`.
    Dialing,

    /// Dial succeeded; a channel is open.
    ///
    /// Sets: `address`.
    Connected,

    /// Dial failed or timed out.
    ///
    /// Sets: `address`, `reason`, `label`.
    DialFailed,

    /// Host info accepted by the collector.
    ///
    /// Sets: `receipt` (collector start time).
    Registered,

    /// Registration rejected or timed out.
    ///
    /// Sets: `reason`, `label`.
    RegistrationFailed,

    /// Both stream workers started under a fresh cancellation scope.
    ///
    /// Sets: `epoch`.
    EpochStarted,

    /// Epoch torn down: both workers joined and the channel closed.
    ///
    /// Sets: `epoch`, `reason` and `label` (absent when ended by shutdown).
    EpochEnded,

    /// Workers still running when the drain grace period ran out; they were aborted.
    ///
    /// Sets: `epoch`, `reason`.
    DrainGraceExceeded,

    // === Retry events ===
    /// Reconnect scheduled after a failure.
    ///
    /// Sets: `attempt` (consecutive failures), `delay_ms`, `reason`, `label`.
    BackoffScheduled,

    /// Consecutive failures exceeded the configured ceiling. Reconnecting continues.
    ///
    /// Sets: `attempt`, `reason`, `label`.
    RetryCeilingExceeded,

    // === Stream events ===
    /// Task descriptor received.
    ///
    /// Sets: `epoch`, `task_id`, `task_kind`.
    TaskReceived,

    /// Task result sent back.
    ///
    /// Sets: `epoch`, `task_id`, `task_kind`, `reason` (`"ok"` or `"failed"`).
    TaskCompleted,

    /// Telemetry tick produced no snapshot.
    ///
    /// Sets: `epoch`.
    SnapshotSkipped,

    // === Runtime events ===
    /// Shutdown requested (token cancelled or OS signal).
    ShutdownRequested,

    /// Supervisor loop exited after a shutdown request.
    SupervisorStopped,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberOverflow,

    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberPanicked,
}

/// Session event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Epoch id, if the event belongs to one.
    pub epoch: Option<u64>,
    /// Collector address.
    pub address: Option<Arc<str>>,
    /// Consecutive failure count.
    pub attempt: Option<u32>,
    /// Backoff delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Registration receipt.
    pub receipt: Option<u64>,
    /// Human-readable reason (errors, outcomes).
    pub reason: Option<Arc<str>>,
    /// Stable error label (see `LinkError::as_label`).
    pub label: Option<&'static str>,
    pub task_id: Option<u64>,
    pub task_kind: Option<u64>,
    /// Subscriber name for overflow/panic events.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            epoch: None,
            address: None,
            attempt: None,
            delay_ms: None,
            receipt: None,
            reason: None,
            label: None,
            task_id: None,
            task_kind: None,
            subscriber: None,
        }
    }

    #[inline]
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    #[inline]
    pub fn with_address(mut self, address: impl Into<Arc<str>>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_receipt(mut self, receipt: u64) -> Self {
        self.receipt = Some(receipt);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches both the message and the stable label of `err`.
    #[inline]
    pub fn with_error(mut self, err: &LinkError) -> Self {
        self.reason = Some(err.to_string().into());
        self.label = Some(err.as_label());
        self
    }

    #[inline]
    pub fn with_task(mut self, task: &TaskDescriptor) -> Self {
        self.task_id = Some(task.id);
        self.task_kind = Some(task.kind);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
