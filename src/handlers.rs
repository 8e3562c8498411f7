//! # Callback seams for telemetry and task execution.
//!
//! The session runtime does not collect metrics or run tasks itself. It calls:
//! - a [`SnapshotSource`] once per report tick (snapshot-or-nothing);
//! - a [`TaskExecutor`] once per received [`TaskDescriptor`].
//!
//! Closures work for both: any `Fn() -> Option<TelemetrySnapshot>` is a snapshot
//! source, and [`ExecutorFn`] wraps an async closure into an executor.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use agentlink::{
//!     ExecutorFn, SnapshotSource, TaskDescriptor, TaskExecutor, TaskResult, TelemetrySnapshot,
//! };
//!
//! let source: Arc<dyn SnapshotSource> = Arc::new(|| Some(TelemetrySnapshot::new(b"cpu=3".to_vec())));
//! assert!(source.snapshot().is_some());
//!
//! let exec: Arc<dyn TaskExecutor> = ExecutorFn::arc("echo", |task: TaskDescriptor| async move {
//!     TaskResult::success(&task, task.data.clone())
//! });
//! assert_eq!(exec.name(), "echo");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{TaskDescriptor, TaskResult, TelemetrySnapshot};

/// Produces the telemetry snapshot for one report tick.
///
/// Returning `None` skips the tick; nothing is queued for later.
pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshot(&self) -> Option<TelemetrySnapshot>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Option<TelemetrySnapshot> + Send + Sync + 'static,
{
    fn snapshot(&self) -> Option<TelemetrySnapshot> {
        self()
    }
}

/// Source used when the host reports no telemetry: every tick is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelemetry;

impl SnapshotSource for NoTelemetry {
    fn snapshot(&self) -> Option<TelemetrySnapshot> {
        None
    }
}

/// Executes one task and produces its result.
///
/// Implementations may do the work asynchronously, but the task worker waits for
/// the returned result before receiving the next task.
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    /// Returns a stable, human-readable executor name.
    fn name(&self) -> &str;

    /// Runs `task` to completion.
    async fn execute(&self, task: TaskDescriptor) -> TaskResult;
}

/// Function-backed executor.
///
/// Wraps a closure that creates a new future per task.
#[derive(Debug)]
pub struct ExecutorFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ExecutorFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the executor and returns it behind an `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> TaskExecutor for ExecutorFn<F>
where
    F: Fn(TaskDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, task: TaskDescriptor) -> TaskResult {
        (self.f)(task).await
    }
}

/// Executor that acknowledges every task as successful without doing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Acknowledge;

#[async_trait]
impl TaskExecutor for Acknowledge {
    fn name(&self) -> &str {
        "acknowledge"
    }

    async fn execute(&self, task: TaskDescriptor) -> TaskResult {
        TaskResult::success(&task, "task acknowledged")
    }
}
