//! # Session and supervisor configuration.
//!
//! Two structs, both immutable once the supervisor is built:
//! - [`SessionConfig`]: *what* to connect to: collector address, TLS mode,
//!   report interval, identity, keepalive. Deserializable from the agent's
//!   config file.
//! - [`SupervisorConfig`]: *how* to supervise the session: timeouts, health
//!   check cadence, retry ceiling, backoff, event bus capacity.
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use agentlink::{SessionConfig, SupervisorConfig, TlsMode};
//!
//! let session: SessionConfig = serde_json::from_str(r#"{
//!     "server": "collector.example.net:5555",
//!     "tls": "on",
//!     "report_interval": 3,
//!     "identity": { "client_secret": "s3cr3t", "client_id": "0f8e" }
//! }"#).unwrap();
//! assert_eq!(session.tls, TlsMode::On);
//! assert_eq!(session.report_interval, Duration::from_secs(3));
//! assert!(session.validate().is_ok());
//!
//! let mut cfg = SupervisorConfig::default();
//! cfg.max_retries = 20;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policies::BackoffPolicy;

/// Transport security mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plaintext.
    #[default]
    Off,
    /// TLS with certificate verification.
    On,
    /// TLS with certificate verification disabled.
    Insecure,
}

impl TlsMode {
    pub fn is_tls(self) -> bool {
        !matches!(self, TlsMode::Off)
    }
}

/// Agent identity presented to the collector on every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub client_secret: String,
    pub client_id: String,
}

/// HTTP/2 keepalive parameters handed to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keepalive {
    /// Ping interval.
    #[serde(with = "secs")]
    pub interval: Duration,
    /// Ping ack timeout.
    #[serde(with = "secs")]
    pub timeout: Duration,
    /// Ping even when no stream is open.
    pub permit_without_stream: bool,
}

impl Default for Keepalive {
    /// `interval = 10s`, `timeout = 3s`, pings permitted while idle.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(3),
            permit_without_stream: true,
        }
    }
}

/// Where and as whom to connect. Immutable for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Collector address as `host:port`.
    pub server: String,
    #[serde(default)]
    pub tls: TlsMode,
    /// Telemetry reporting interval (seconds in serialized form).
    #[serde(with = "secs")]
    pub report_interval: Duration,
    pub identity: Identity,
    #[serde(default)]
    pub keepalive: Keepalive,
}

impl SessionConfig {
    pub fn new(server: impl Into<String>, identity: Identity) -> Self {
        Self {
            server: server.into(),
            tls: TlsMode::Off,
            report_interval: Duration::from_secs(1),
            identity,
            keepalive: Keepalive::default(),
        }
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Checks the address shape, the interval and the identity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        split_host_port(&self.server)?;
        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroReportInterval);
        }
        if self.identity.client_id.is_empty() {
            return Err(ConfigError::EmptyIdentity { field: "client_id" });
        }
        if self.identity.client_secret.is_empty() {
            return Err(ConfigError::EmptyIdentity {
                field: "client_secret",
            });
        }
        Ok(())
    }
}

/// Splits `host:port`, accepting bracketed IPv6 hosts (`[::1]:5555`).
pub fn split_host_port(address: &str) -> Result<(&str, u16), ConfigError> {
    let invalid = |reason| ConfigError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let (host, port) = address.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .ok_or_else(|| invalid("unterminated ipv6 bracket"))?,
        None if host.contains(':') => return Err(invalid("ipv6 host must be bracketed")),
        None => host,
    };
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
    Ok((host, port))
}

/// Supervision knobs.
///
/// ## Field semantics
/// - `dial_timeout`: bound on one dial attempt
/// - `register_timeout`: bound on the host info registration call
/// - `health_check_interval`: how often a live epoch polls channel readiness
/// - `drain_grace`: how long teardown waits for the stream workers before
///   aborting them (`0s` = abort immediately)
/// - `max_retries`: retry ceiling; caps backoff growth and flags persistent
///   failure once exceeded, never stops reconnecting
/// - `backoff`: reconnect delay schedule
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub dial_timeout: Duration,
    pub register_timeout: Duration,
    pub health_check_interval: Duration,
    pub drain_grace: Duration,
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Attempt number handed to the backoff policy: the failure count, capped at the ceiling.
    #[inline]
    pub fn backoff_attempt(&self, failures: u32) -> u32 {
        failures.min(self.max_retries.max(1))
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `dial_timeout = 30s`
    /// - `register_timeout = 10s`
    /// - `health_check_interval = 1s`
    /// - `drain_grace = 60s`
    /// - `max_retries = 10`
    /// - `backoff = BackoffPolicy::default()` (5s doubling to 5min)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(30),
            register_timeout: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(1),
            drain_grace: Duration::from_secs(60),
            max_retries: 10,
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

/// Serializes a `Duration` as whole seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
