//! # Wire-level values exchanged with the collector.
//!
//! These mirror the collector's RPC messages without tying the crate to a codec:
//! the transport collaborator converts them to and from its own encoding.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Static host description sent once per connection during registration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub platform: String,
    pub platform_version: String,
    pub cpu: Vec<String>,
    pub mem_total: u64,
    pub disk_total: u64,
    pub swap_total: u64,
    pub arch: String,
    pub virtualization: String,
    pub boot_time: u64,
    pub version: String,
}

/// Collector's answer to a registration: a numeric receipt (the collector's start time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt(pub u64);

/// One opaque unit of telemetry, produced externally and sent at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub payload: Vec<u8>,
}

impl TelemetrySnapshot {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Task pushed by the collector on the task stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: u64,
    /// Collector-defined task type.
    #[serde(rename = "type")]
    pub kind: u64,
    /// Opaque task parameters.
    pub data: String,
}

impl TaskDescriptor {
    pub fn new(id: u64, kind: u64, data: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            data: data.into(),
        }
    }
}

/// Result sent back for exactly one [`TaskDescriptor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: u64,
    pub successful: bool,
    /// Execution time in seconds.
    pub delay: f32,
    /// Opaque result payload.
    pub data: String,
}

impl TaskResult {
    /// Successful result for `task`.
    pub fn success(task: &TaskDescriptor, data: impl Into<String>) -> Self {
        Self {
            id: task.id,
            kind: task.kind,
            successful: true,
            delay: 0.0,
            data: data.into(),
        }
    }

    /// Failed result for `task`.
    pub fn failure(task: &TaskDescriptor, data: impl Into<String>) -> Self {
        Self {
            successful: false,
            ..Self::success(task, data)
        }
    }

    /// Records how long execution took.
    pub fn with_delay(mut self, elapsed: Duration) -> Self {
        self.delay = elapsed.as_secs_f32();
        self
    }
}
