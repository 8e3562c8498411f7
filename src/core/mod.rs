//! Connection core: the reconnect state machine and its parts.
//!
//! The public entry point is [`ConnectionSupervisor`]; health checks read
//! [`StatusRegistry`].
//!
//! Internal modules:
//! - [`retry`]: consecutive-failure accounting and the retry ceiling;
//! - [`epoch`]: one shared cancellation scope and join barrier per session;
//! - [`supervisor`]: dial, register, stream, drain, back off, repeat;
//! - [`status`]: copy-out status snapshots;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod epoch;
mod retry;
mod shutdown;
mod status;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use retry::{ErrorInfo, RetryState, RetryTracker};
pub use status::{ConnectionStatus, Phase, StatusRegistry};
pub use supervisor::ConnectionSupervisor;
