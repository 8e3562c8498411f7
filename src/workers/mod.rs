//! Per-epoch stream workers.
//!
//! Each epoch runs exactly two workers under one shared cancellation scope:
//! - [`TelemetryWorker`] owns the outbound state stream;
//! - [`TaskWorker`] owns the bidirectional task stream.
//!
//! Both return `Ok(())` when the scope is cancelled and `Err(LinkError)` when
//! their stream fails; either way the epoch cancels the scope for the other one.

mod tasks;
mod telemetry;

pub use tasks::TaskWorker;
pub use telemetry::TelemetryWorker;
