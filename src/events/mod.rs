//! Session events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ConnectionSupervisor`, `Epoch`, `TelemetryWorker`,
//!   `TaskWorker`, `SubscriberSet` workers (panic).
//! - **Consumers**: the supervisor's subscriber listener, which fans out to
//!   the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
