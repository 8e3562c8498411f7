//! # RetryTracker: consecutive-failure accounting.
//!
//! Owned by the supervisor task (single writer). Readers get copies through
//! [`RetryTracker::snapshot`], published into the status registry after each change.
//!
//! ## Rules
//! - `record_failure` increments the attempt count and remembers the error.
//! - `record_success` resets the count to exactly 0; error history is kept.
//! - Between successes the count never decreases.
//! - Past the ceiling the tracker reports [`RetryState::persistent`]; it never
//!   stops the caller from retrying.

use std::time::SystemTime;

use serde::Serialize;

use crate::error::{FailureKind, LinkError};

/// Copy of the last recorded failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub label: &'static str,
    pub message: String,
}

impl From<&LinkError> for ErrorInfo {
    fn from(err: &LinkError) -> Self {
        Self {
            kind: err.kind(),
            label: err.as_label(),
            message: err.to_string(),
        }
    }
}

/// Immutable view of the tracker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Consecutive failures since the last success.
    pub attempt: u32,
    pub last_error: Option<ErrorInfo>,
    pub last_error_at: Option<SystemTime>,
    /// Attempt count exceeded the configured ceiling.
    pub persistent: bool,
}

#[derive(Debug)]
pub struct RetryTracker {
    state: RetryState,
    ceiling: u32,
}

impl RetryTracker {
    pub fn new(ceiling: u32) -> Self {
        Self {
            state: RetryState::default(),
            ceiling,
        }
    }

    /// Counts one failure; returns the new attempt count (1-based).
    pub fn record_failure(&mut self, err: &LinkError) -> u32 {
        self.state.attempt = self.state.attempt.saturating_add(1);
        self.state.last_error = Some(ErrorInfo::from(err));
        self.state.last_error_at = Some(SystemTime::now());
        self.state.persistent = self.state.attempt > self.ceiling;
        self.state.attempt
    }

    pub fn record_success(&mut self) {
        self.state.attempt = 0;
        self.state.persistent = false;
    }

    pub fn attempt(&self) -> u32 {
        self.state.attempt
    }

    /// True once consecutive failures exceed the ceiling.
    pub fn ceiling_exceeded(&self) -> bool {
        self.state.persistent
    }

    pub fn snapshot(&self) -> RetryState {
        self.state.clone()
    }
}
