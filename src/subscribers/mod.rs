//! # Event subscribers.
//!
//! ```text
//! Supervisor/Epoch/Workers ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                        │
//!                                                            ┌───────────┼──────────┐
//!                                                            ▼           ▼          ▼
//!                                                        LogWriter    metrics    custom
//! ```
//!
//! - [`Subscribe`]: trait for custom observers.
//! - [`SubscriberSet`]: non-blocking fan-out with per-subscriber queues.
//! - [`LogWriter`]: default `tracing` renderer.

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
