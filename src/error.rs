//! Error types used by the agentlink session runtime.
//!
//! This module defines the error enums surfaced by the crate:
//!
//! - [`LinkError`]: everything that ends an epoch or prevents one from starting.
//! - [`TransportError`]: opaque failure reported by a transport collaborator.
//! - [`ConfigError`]: rejected [`SessionConfig`](crate::SessionConfig) values.
//! - [`ProbeError`]: failures of the reachability probe.
//!
//! Each type provides `as_label` for logs/metrics. [`LinkError::kind`] folds the
//! variants into the four-way [`FailureKind`] taxonomy the supervisor reasons about.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::transport::ChannelState;

/// Which data-plane stream a stream error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Outbound telemetry ("report state") stream.
    State,
    /// Bidirectional task ("request task") stream.
    Task,
}

impl StreamKind {
    /// Returns a short stable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::State => "state",
            StreamKind::Task => "task",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`LinkError`].
///
/// All four are handled identically by the supervisor (end the epoch, feed the
/// retry tracker); the split exists for logs and status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Dial,
    Registration,
    Stream,
    ConnectionDegraded,
}

/// Opaque error produced by a transport collaborator.
///
/// The core never inspects it beyond logging; `code` carries an optional
/// transport-level status code (e.g. an RPC status).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// Optional transport status code.
    pub code: Option<i32>,
    /// Human-readable cause.
    pub message: String,
}

impl TransportError {
    /// Creates an error without a status code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates an error carrying a transport status code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// # Errors that end a session epoch (or keep one from starting).
///
/// None of these is fatal to the process: the supervisor records them and
/// schedules a reconnect.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum LinkError {
    /// Transport could not open a channel to the collector.
    #[error("dial {address} failed: {source}")]
    Dial {
        /// Collector address (`host:port`).
        address: String,
        /// Transport cause.
        source: TransportError,
    },

    /// Dial did not complete within the configured timeout.
    #[error("dial {address} timed out after {timeout:?}")]
    DialTimeout { address: String, timeout: Duration },

    /// Collector rejected the host info registration.
    #[error("host registration rejected: {source}")]
    Registration { source: TransportError },

    /// Registration did not complete within the configured timeout.
    #[error("host registration timed out after {timeout:?}")]
    RegistrationTimeout { timeout: Duration },

    /// Send, receive or open failed on one of the data-plane streams.
    #[error("{stream} stream failed: {source}")]
    Stream {
        stream: StreamKind,
        source: TransportError,
    },

    /// Collector closed a stream.
    #[error("{stream} stream closed by collector")]
    StreamClosed { stream: StreamKind },

    /// Channel left the ready state while streaming.
    #[error("connection degraded: channel state {state}")]
    ConnectionDegraded { state: ChannelState },

    /// A stream worker panicked.
    #[error("stream worker panicked: {info}")]
    WorkerPanicked { info: String },

    /// Both stream workers returned without reporting a cause.
    #[error("stream workers exited without an error")]
    WorkersExited,
}

impl LinkError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            LinkError::Dial { .. } | LinkError::DialTimeout { .. } => FailureKind::Dial,
            LinkError::Registration { .. } | LinkError::RegistrationTimeout { .. } => {
                FailureKind::Registration
            }
            LinkError::Stream { .. }
            | LinkError::StreamClosed { .. }
            | LinkError::WorkerPanicked { .. }
            | LinkError::WorkersExited => FailureKind::Stream,
            LinkError::ConnectionDegraded { .. } => FailureKind::ConnectionDegraded,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use agentlink::LinkError;
    ///
    /// let err = LinkError::RegistrationTimeout { timeout: Duration::from_secs(10) };
    /// assert_eq!(err.as_label(), "registration_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LinkError::Dial { .. } => "dial_failed",
            LinkError::DialTimeout { .. } => "dial_timeout",
            LinkError::Registration { .. } => "registration_rejected",
            LinkError::RegistrationTimeout { .. } => "registration_timeout",
            LinkError::Stream { .. } => "stream_failed",
            LinkError::StreamClosed { .. } => "stream_closed",
            LinkError::ConnectionDegraded { .. } => "connection_degraded",
            LinkError::WorkerPanicked { .. } => "worker_panicked",
            LinkError::WorkersExited => "workers_exited",
        }
    }
}

/// Rejected session configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Server address is not `host:port`.
    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// Reporting interval must be positive.
    #[error("report interval must be greater than zero")]
    ZeroReportInterval,

    /// Client id or secret is empty.
    #[error("identity field {field} is empty")]
    EmptyIdentity { field: &'static str },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidAddress { .. } => "config_invalid_address",
            ConfigError::ZeroReportInterval => "config_zero_report_interval",
            ConfigError::EmptyIdentity { .. } => "config_empty_identity",
        }
    }
}

/// Failures of the DNS/TCP reachability probe.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Address(#[from] ConfigError),

    #[error("dns lookup for {host} failed: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    #[error("dns lookup for {host} returned no addresses")]
    NoAddresses { host: String },

    #[error("tcp connect to {address} failed: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    #[error("tcp connect to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },
}

impl ProbeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::Address(_) => "probe_invalid_address",
            ProbeError::Resolve { .. } => "probe_dns_failed",
            ProbeError::NoAddresses { .. } => "probe_dns_empty",
            ProbeError::Connect { .. } => "probe_connect_failed",
            ProbeError::ConnectTimeout { .. } => "probe_connect_timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let dial = LinkError::DialTimeout {
            address: "collector:5555".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(dial.kind(), FailureKind::Dial);

        let closed = LinkError::StreamClosed {
            stream: StreamKind::Task,
        };
        assert_eq!(closed.kind(), FailureKind::Stream);

        let panicked = LinkError::WorkerPanicked { info: "boom".into() };
        assert_eq!(panicked.kind(), FailureKind::Stream);

        let degraded = LinkError::ConnectionDegraded {
            state: ChannelState::TransientFailure,
        };
        assert_eq!(degraded.kind(), FailureKind::ConnectionDegraded);
        assert_eq!(degraded.as_label(), "connection_degraded");
    }

    #[test]
    fn display_carries_cause() {
        let err = LinkError::Stream {
            stream: StreamKind::State,
            source: TransportError::with_code(14, "unavailable"),
        };
        assert_eq!(err.to_string(), "state stream failed: unavailable");
    }
}
