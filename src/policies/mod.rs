//! Reconnect timing policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how reconnect delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid reconnect storms
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig { backoff: BackoffPolicy, max_retries, .. }
//!      └─► core::supervisor uses:
//!           - retry tracker attempt count (capped at max_retries)
//!           - backoff.delay(attempt) to schedule the next dial
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=5s, factor=2.0, max=5min, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
