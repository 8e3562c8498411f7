//! # Channel handle and data-plane streams.
//!
//! A [`Channel`] is what a successful dial yields. The core uses it to:
//! - register the host ([`Channel::report_host_info`], unary);
//! - open the client-streaming state stream ([`StateSink`]);
//! - open the bidirectional task stream ([`TaskStream`]);
//! - poll readiness ([`Channel::state`]), compared structurally to [`ChannelState::Ready`].

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::TransportError;
use crate::model::{HostInfo, RegistrationReceipt, TaskDescriptor, TaskResult, TelemetrySnapshot};

/// Connectivity state reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    Idle,
    Connecting,
    Ready,
    TransientFailure,
    Shutdown,
}

impl ChannelState {
    /// True only for [`ChannelState::Ready`].
    #[inline]
    pub fn is_ready(self) -> bool {
        matches!(self, ChannelState::Ready)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Idle => "IDLE",
            ChannelState::Connecting => "CONNECTING",
            ChannelState::Ready => "READY",
            ChannelState::TransientFailure => "TRANSIENT_FAILURE",
            ChannelState::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open connection to the collector.
///
/// Shared between the supervisor, the status registry and the epoch, hence `&self`
/// everywhere. Per-call credentials are the transport's concern.
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    /// Current connectivity state. Must not block.
    fn state(&self) -> ChannelState;

    /// Unary "report host info" call.
    async fn report_host_info(&self, host: &HostInfo)
    -> Result<RegistrationReceipt, TransportError>;

    /// Opens the client-streaming "report state" call.
    async fn open_state_stream(&self) -> Result<Box<dyn StateSink>, TransportError>;

    /// Opens the bidirectional "request task" call.
    async fn open_task_stream(&self) -> Result<Box<dyn TaskStream>, TransportError>;

    /// Releases the connection. Called once, after both workers have joined.
    async fn close(&self);
}

/// Outbound half of the state stream.
#[async_trait]
pub trait StateSink: Send + 'static {
    async fn send(&mut self, snapshot: TelemetrySnapshot) -> Result<(), TransportError>;
}

/// Both halves of the task stream.
#[async_trait]
pub trait TaskStream: Send + 'static {
    /// Waits for the next task. `Ok(None)` means the collector closed the stream.
    async fn recv(&mut self) -> Result<Option<TaskDescriptor>, TransportError>;

    async fn send(&mut self, result: TaskResult) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ready_is_ready() {
        let all = [
            ChannelState::Idle,
            ChannelState::Connecting,
            ChannelState::Ready,
            ChannelState::TransientFailure,
            ChannelState::Shutdown,
        ];
        let ready: Vec<_> = all.iter().filter(|s| s.is_ready()).collect();
        assert_eq!(ready, vec![&ChannelState::Ready]);
        assert_eq!(ChannelState::TransientFailure.to_string(), "TRANSIENT_FAILURE");
    }
}
