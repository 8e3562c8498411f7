//! # agentlink
//!
//! **agentlink** keeps a monitoring agent connected to its collector: it dials,
//! registers the host, streams telemetry and serves tasks, and reconnects with
//! exponential backoff whenever any of that fails.
//!
//! The crate owns the session lifecycle only. The transport (a gRPC stack or
//! anything else) plugs in through [`Dialer`] / [`Channel`]; metric collection
//! and task execution plug in through [`SnapshotSource`] / [`TaskExecutor`].
//!
//! ## Architecture
//! ```text
//!                        ┌──────────────────────────────────────────┐
//!                        │  ConnectionSupervisor (state machine)    │
//!                        │  - SessionDialer (30s dial, 10s register)│
//!                        │  - RetryTracker + BackoffPolicy          │
//!                        │  - StatusRegistry (health snapshots)     │
//!                        └──────┬───────────────────────────┬───────┘
//!                               │ one Epoch at a time        │ publish(Event)
//!                               ▼                            ▼
//!               ┌──────────── Epoch ────────────┐     Bus (broadcast)
//!               │ shared CancellationToken scope│            │
//!               │ JoinSet (join barrier)        │            ▼
//!               │ channel health check (1s)     │     subscriber listener
//!               └──────┬─────────────────┬──────┘            │
//!                      ▼                 ▼                   ▼
//!              TelemetryWorker      TaskWorker         SubscriberSet
//!              tick → snapshot      recv → execute    ┌─────┼─────┐
//!              → StateSink          → send result     ▼     ▼     ▼
//!                                                  LogWriter  ...  custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! loop {
//!   ├─► Dialing      dial (bounded)            ── err ─┐
//!   ├─► Registering  report host info (bounded) ── err ─┤
//!   │                retry.record_success()            │
//!   ├─► Streaming    open streams, start Epoch         │
//!   │                wait: worker error / panic /      │
//!   │                      channel not Ready           │
//!   ├─► Draining     cancel scope, join both, close    │
//!   └─► Backoff      ◄─────────────────────────────────┘
//!                    attempt = retry.record_failure(err)
//!                    sleep(backoff.delay(min(attempt, max_retries)))
//! }
//! exit only when the shutdown token is cancelled
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Reconnect loop, one epoch at a time.                     | [`ConnectionSupervisor`]                    |
//! | **Policies**      | Exponential backoff with optional jitter.                | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Status**        | Copy-out health snapshots, JSON rendering.               | [`StatusRegistry`], [`ConnectionStatus`]    |
//! | **Transport**     | Collaborator seams for channels and streams.             | [`Dialer`], [`Channel`], [`Credentials`]    |
//! | **Callbacks**     | Telemetry snapshots and task execution.                  | [`SnapshotSource`], [`TaskExecutor`]        |
//! | **Events**        | Lifecycle events fanned out to subscribers.              | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Errors**        | Typed failure taxonomy.                                  | [`LinkError`], [`FailureKind`]              |
//! | **Configuration** | Session and supervision settings.                        | [`SessionConfig`], [`SupervisorConfig`]     |
//! | **Diagnostics**   | DNS + TCP reachability probe.                            | [`probe::probe`]                            |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentlink::{ConnectionSupervisor, Dialer, Identity, SessionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(dialer: Arc<dyn Dialer>) -> Result<(), agentlink::ConfigError> {
//! let session = SessionConfig::new(
//!     "collector.example.com:5555",
//!     Identity { client_secret: "s3cret".into(), client_id: "agent-42".into() },
//! );
//!
//! let supervisor = ConnectionSupervisor::builder(session, dialer).build()?;
//! let status = supervisor.status();
//!
//! let shutdown = CancellationToken::new();
//! let run = tokio::spawn(supervisor.run(shutdown.clone()));
//!
//! println!("{}", status.snapshot().await.to_json());
//! shutdown.cancel();
//! let _ = run.await;
//! # Ok(())
//! # }
//! ```

mod config;
mod core;
mod error;
mod events;
mod handlers;
mod model;
mod policies;
mod subscribers;
mod transport;
mod workers;

pub mod probe;

// ---- Public re-exports ----

pub use config::{Identity, Keepalive, SessionConfig, SupervisorConfig, TlsMode, split_host_port};
pub use crate::core::{
    ConnectionStatus, ConnectionSupervisor, ErrorInfo, Phase, RetryState, RetryTracker,
    StatusRegistry, SupervisorBuilder,
};
pub use error::{ConfigError, FailureKind, LinkError, ProbeError, StreamKind, TransportError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{Acknowledge, ExecutorFn, NoTelemetry, SnapshotSource, TaskExecutor};
pub use model::{HostInfo, RegistrationReceipt, TaskDescriptor, TaskResult, TelemetrySnapshot};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use transport::{
    Channel, ChannelState, Credentials, DialTarget, Dialer, SecretAuth, SessionDialer, StateSink,
    TaskStream,
};
pub use workers::{TaskWorker, TelemetryWorker};
