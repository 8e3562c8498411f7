//! # StatusRegistry: queryable connection status for health checks.
//!
//! The supervisor pushes every state transition here (phase, retry state, live
//! channel and epoch). Callers read a [`ConnectionStatus`] copy; nothing outside
//! the supervisor can mutate it.
//!
//! ```text
//! Supervisor ──set_phase/set_retry/attach──► RwLock<Inner> ◄──snapshot()── health check
//!                                                 │
//!                                   channel.state() read at snapshot time
//! ```
//!
//! ## Rules
//! - A snapshot is taken under one read lock, so fields never tear.
//! - `connected` is recomputed on every call: a live epoch whose channel is `Ready`.
//! - No lock is held across a network call; `Channel::state` must not block.

use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::core::retry::{ErrorInfo, RetryState};
use crate::transport::{Channel, ChannelState};

/// Supervisor state-machine position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Disconnected,
    Dialing,
    Registering,
    Streaming,
    Draining,
    Backoff,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Disconnected => "disconnected",
            Phase::Dialing => "dialing",
            Phase::Registering => "registering",
            Phase::Streaming => "streaming",
            Phase::Draining => "draining",
            Phase::Backoff => "backoff",
        }
    }
}

/// Point-in-time view of the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// An epoch is live and its channel reports `Ready`.
    pub connected: bool,
    pub phase: Phase,
    /// Consecutive failures since the last successful registration.
    pub retry_count: u32,
    pub last_error: Option<ErrorInfo>,
    pub last_error_at: Option<SystemTime>,
    /// State of the current channel, if one is open.
    pub channel_state: Option<ChannelState>,
    /// Failures exceeded the retry ceiling; reconnecting continues regardless.
    pub persistent_failure: bool,
    /// Id of the live epoch.
    pub epoch: Option<u64>,
}

impl ConnectionStatus {
    /// Renders the status as a flat JSON object.
    ///
    /// `last_error_time` is RFC 3339 (UTC); `connection_state` is present only
    /// while a channel is open.
    ///
    /// # Example
    /// ```
    /// use agentlink::StatusRegistry;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let status = StatusRegistry::new().snapshot().await;
    /// let json = status.to_json();
    /// assert_eq!(json["connected"], false);
    /// assert_eq!(json["retry_count"], 0);
    /// assert_eq!(json["phase"], "disconnected");
    /// # }
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        let last_error_time = self
            .last_error_at
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true));

        let mut status = json!({
            "connected": self.connected,
            "phase": self.phase.as_str(),
            "retry_count": self.retry_count,
            "last_error": self.last_error.as_ref().map(|e| e.message.as_str()),
            "last_error_kind": self.last_error.as_ref().map(|e| e.label),
            "last_error_time": last_error_time,
            "persistent_failure": self.persistent_failure,
            "epoch": self.epoch,
        });
        if let Some(state) = self.channel_state {
            status["connection_state"] = state.as_str().into();
        }
        status
    }
}

#[derive(Default)]
struct Inner {
    phase: Phase,
    retry: RetryState,
    channel: Option<Arc<dyn Channel>>,
    epoch: Option<u64>,
}

/// Shared, read-mostly status store. Written only by the supervisor.
pub struct StatusRegistry {
    inner: RwLock<Inner>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Returns a consistent copy of the current status.
    pub async fn snapshot(&self) -> ConnectionStatus {
        let inner = self.inner.read().await;
        let channel_state = inner.channel.as_ref().map(|c| c.state());
        let connected = inner.epoch.is_some() && channel_state.is_some_and(ChannelState::is_ready);

        ConnectionStatus {
            connected,
            phase: inner.phase,
            retry_count: inner.retry.attempt,
            last_error: inner.retry.last_error.clone(),
            last_error_at: inner.retry.last_error_at,
            channel_state,
            persistent_failure: inner.retry.persistent,
            epoch: inner.epoch,
        }
    }

    pub(crate) async fn set_phase(&self, phase: Phase) {
        self.inner.write().await.phase = phase;
    }

    pub(crate) async fn set_retry(&self, retry: RetryState) {
        self.inner.write().await.retry = retry;
    }

    /// Records a freshly dialed channel (phase `Registering`).
    pub(crate) async fn attach_channel(&self, channel: Arc<dyn Channel>) {
        let mut inner = self.inner.write().await;
        inner.phase = Phase::Registering;
        inner.channel = Some(channel);
    }

    /// Marks the epoch live (phase `Streaming`).
    pub(crate) async fn epoch_started(&self, epoch: u64) {
        let mut inner = self.inner.write().await;
        inner.phase = Phase::Streaming;
        inner.epoch = Some(epoch);
    }

    /// Forgets the channel and epoch once they are torn down.
    pub(crate) async fn detach(&self) {
        let mut inner = self.inner.write().await;
        inner.channel = None;
        inner.epoch = None;
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}
