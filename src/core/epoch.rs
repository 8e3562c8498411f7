//! # Epoch: one connect-register-stream lifetime, torn down as a unit.
//!
//! ```text
//! Epoch::start(channel, streams)
//!   scope = shutdown.child_token()
//!   JoinSet ──► TelemetryWorker::run(scope)   (drop guard cancels scope on exit)
//!           └─► TaskWorker::run(scope)        (drop guard cancels scope on exit)
//!
//! wait():  first of
//!   ├─ shutdown cancelled          → EpochEnd::Stopped
//!   ├─ worker returned Err(e)      → EpochEnd::Failed(e)
//!   ├─ worker panicked             → EpochEnd::Failed(WorkerPanicked)
//!   ├─ both workers gone, no error → EpochEnd::Failed(WorkersExited)
//!   └─ health tick, channel !Ready → EpochEnd::Failed(ConnectionDegraded)
//!
//! drain(): scope.cancel() → join both workers (up to drain_grace)
//!          ├─ grace exceeded → DrainGraceExceeded, abort_all, join the aborted
//!          └─ channel.close()
//! ```
//!
//! ## Rules
//! - Both workers share exactly one scope; whichever exits first cancels it.
//! - Cancelling the scope more than once is harmless.
//! - `drain` returns only after both workers have joined, so the supervisor
//!   cannot dial again while an old worker is still alive. A worker that ignores
//!   cancellation (a stuck executor) is aborted once `drain_grace` runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::LinkError;
use crate::events::{Bus, Event, EventKind};
use crate::handlers::{SnapshotSource, TaskExecutor};
use crate::transport::{Channel, StateSink, TaskStream};
use crate::workers::{TaskWorker, TelemetryWorker};

/// Everything an epoch needs besides its channel and streams.
#[derive(Clone)]
pub(crate) struct EpochParams {
    pub report_interval: Duration,
    pub health_check_interval: Duration,
    pub drain_grace: Duration,
    pub source: Arc<dyn SnapshotSource>,
    pub executor: Arc<dyn TaskExecutor>,
    pub bus: Bus,
}

/// Why an epoch (or an attempt to start one) ended.
#[derive(Debug)]
pub(crate) enum EpochEnd {
    /// External shutdown; not a failure.
    Stopped,
    Failed(LinkError),
}

pub(crate) struct Epoch {
    id: u64,
    channel: Arc<dyn Channel>,
    scope: CancellationToken,
    workers: JoinSet<Result<(), LinkError>>,
    health_check_interval: Duration,
    drain_grace: Duration,
    bus: Bus,
}

impl Epoch {
    /// Spawns both stream workers under a fresh scope derived from `shutdown`.
    pub fn start(
        id: u64,
        channel: Arc<dyn Channel>,
        sink: Box<dyn StateSink>,
        stream: Box<dyn TaskStream>,
        params: &EpochParams,
        shutdown: &CancellationToken,
    ) -> Self {
        let scope = shutdown.child_token();
        let mut workers = JoinSet::new();

        let telemetry = TelemetryWorker::new(
            id,
            params.report_interval,
            Arc::clone(&params.source),
            sink,
            params.bus.clone(),
        );
        let token = scope.clone();
        workers.spawn(async move {
            let _guard = token.clone().drop_guard();
            telemetry.run(token).await
        });

        let tasks = TaskWorker::new(id, Arc::clone(&params.executor), stream, params.bus.clone());
        let token = scope.clone();
        workers.spawn(async move {
            let _guard = token.clone().drop_guard();
            tasks.run(token).await
        });

        Self {
            id,
            channel,
            scope,
            workers,
            health_check_interval: params.health_check_interval,
            drain_grace: params.drain_grace,
            bus: params.bus.clone(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the first reason to end this epoch. Does not tear anything down.
    pub async fn wait(&mut self, shutdown: &CancellationToken) -> EpochEnd {
        let period = self.health_check_interval.max(Duration::from_millis(1));
        let mut health = time::interval_at(Instant::now() + period, period);
        health.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            select! {
                biased;
                _ = shutdown.cancelled() => return EpochEnd::Stopped,
                joined = self.workers.join_next() => match joined {
                    // Ok only follows a cancelled scope: keep collecting until the cause shows up.
                    Some(Ok(Ok(()))) => continue,
                    Some(Ok(Err(err))) => return EpochEnd::Failed(err),
                    Some(Err(join_err)) => {
                        return EpochEnd::Failed(LinkError::WorkerPanicked {
                            info: join_err.to_string(),
                        });
                    }
                    // Only shutdown may end an epoch without a failure.
                    None => return EpochEnd::Failed(LinkError::WorkersExited),
                },
                _ = health.tick() => {
                    let state = self.channel.state();
                    if !state.is_ready() {
                        return EpochEnd::Failed(LinkError::ConnectionDegraded { state });
                    }
                }
            }
        }
    }

    /// Cancels the scope, joins both workers, then closes the channel.
    ///
    /// Workers still running after `drain_grace` are aborted and joined.
    pub async fn drain(mut self) {
        self.scope.cancel();

        let grace = self.drain_grace;
        if time::timeout(grace, join_all(&mut self.workers, self.id)).await.is_err() {
            let stuck = self.workers.len();
            tracing::warn!(epoch = self.id, stuck, ?grace, "aborting stream workers after drain grace");
            self.bus.publish(
                Event::new(EventKind::DrainGraceExceeded)
                    .with_epoch(self.id)
                    .with_reason(format!("{stuck} worker(s) still running after {grace:?}")),
            );
            self.workers.abort_all();
            join_all(&mut self.workers, self.id).await;
        }

        self.channel.close().await;
    }
}

async fn join_all(workers: &mut JoinSet<Result<(), LinkError>>, epoch: u64) {
    while let Some(joined) = workers.join_next().await {
        if let Err(join_err) = joined {
            tracing::debug!(epoch, error = %join_err, "worker ended abnormally during drain");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StreamKind, TransportError};
    use crate::handlers::{Acknowledge, ExecutorFn, NoTelemetry};
    use crate::model::{HostInfo, RegistrationReceipt, TaskDescriptor, TaskResult, TelemetrySnapshot};
    use crate::transport::ChannelState;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestChannel {
        state: Mutex<ChannelState>,
        closed: AtomicBool,
    }

    impl TestChannel {
        fn ready() -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(ChannelState::Ready),
                closed: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl Channel for TestChannel {
        fn state(&self) -> ChannelState {
            *self.state.lock().expect("state lock")
        }
        async fn report_host_info(&self, _: &HostInfo) -> Result<RegistrationReceipt, TransportError> {
            Ok(RegistrationReceipt(1))
        }
        async fn open_state_stream(&self) -> Result<Box<dyn StateSink>, TransportError> {
            Err(TransportError::new("unused"))
        }
        async fn open_task_stream(&self) -> Result<Box<dyn TaskStream>, TransportError> {
            Err(TransportError::new("unused"))
        }
        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct NullSink;

    #[async_trait]
    impl StateSink for NullSink {
        async fn send(&mut self, _: TelemetrySnapshot) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Blocks in recv until the scope cancels it; flags whether it was dropped.
    struct BlockedTasks(Arc<AtomicBool>);

    #[async_trait]
    impl TaskStream for BlockedTasks {
        async fn recv(&mut self) -> Result<Option<TaskDescriptor>, TransportError> {
            std::future::pending().await
        }
        async fn send(&mut self, _: TaskResult) -> Result<(), TransportError> {
            Ok(())
        }
    }

    impl Drop for BlockedTasks {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    struct FailingSink;

    #[async_trait]
    impl StateSink for FailingSink {
        async fn send(&mut self, _: TelemetrySnapshot) -> Result<(), TransportError> {
            Err(TransportError::new("broken pipe"))
        }
    }

    /// Yields one task, then blocks.
    struct OneTask(Option<TaskDescriptor>);

    #[async_trait]
    impl TaskStream for OneTask {
        async fn recv(&mut self) -> Result<Option<TaskDescriptor>, TransportError> {
            match self.0.take() {
                Some(task) => Ok(Some(task)),
                None => std::future::pending().await,
            }
        }
        async fn send(&mut self, _: TaskResult) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn params(source: Arc<dyn SnapshotSource>) -> EpochParams {
        EpochParams {
            report_interval: Duration::from_secs(1),
            health_check_interval: Duration::from_secs(1),
            drain_grace: Duration::from_secs(5),
            source,
            executor: Arc::new(Acknowledge),
            bus: Bus::new(64),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn telemetry_failure_cancels_task_worker() {
        let channel = TestChannel::ready();
        let task_dropped = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();
        let source: Arc<dyn SnapshotSource> = Arc::new(|| Some(TelemetrySnapshot::new(vec![1])));

        let mut epoch = Epoch::start(
            7,
            channel.clone(),
            Box::new(FailingSink),
            Box::new(BlockedTasks(task_dropped.clone())),
            &params(source),
            &shutdown,
        );
        assert_eq!(epoch.id(), 7);

        let end = epoch.wait(&shutdown).await;
        assert!(matches!(
            end,
            EpochEnd::Failed(LinkError::Stream { stream: StreamKind::State, .. })
        ));

        epoch.drain().await;
        assert!(task_dropped.load(Ordering::SeqCst), "task worker joined");
        assert!(channel.closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_channel_ends_epoch() {
        let channel = TestChannel::ready();
        let shutdown = CancellationToken::new();
        let mut epoch = Epoch::start(
            1,
            channel.clone(),
            Box::new(NullSink),
            Box::new(BlockedTasks(Arc::new(AtomicBool::new(false)))),
            &params(Arc::new(NoTelemetry)),
            &shutdown,
        );

        *channel.state.lock().expect("state lock") = ChannelState::TransientFailure;
        let end = epoch.wait(&shutdown).await;
        assert!(matches!(
            end,
            EpochEnd::Failed(LinkError::ConnectionDegraded {
                state: ChannelState::TransientFailure
            })
        ));
        epoch.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_not_a_failure() {
        let channel = TestChannel::ready();
        let shutdown = CancellationToken::new();
        let mut epoch = Epoch::start(
            1,
            channel.clone(),
            Box::new(NullSink),
            Box::new(BlockedTasks(Arc::new(AtomicBool::new(false)))),
            &params(Arc::new(NoTelemetry)),
            &shutdown,
        );

        shutdown.cancel();
        assert!(matches!(epoch.wait(&shutdown).await, EpochEnd::Stopped));
        epoch.drain().await;
        assert!(channel.closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_executor_is_aborted_after_drain_grace() {
        let channel = TestChannel::ready();
        let shutdown = CancellationToken::new();
        let mut p = params(Arc::new(NoTelemetry));
        p.executor = ExecutorFn::arc("stuck", |_task: TaskDescriptor| std::future::pending::<TaskResult>());
        let mut events = p.bus.subscribe();

        let epoch = Epoch::start(
            4,
            channel.clone(),
            Box::new(NullSink),
            Box::new(OneTask(Some(TaskDescriptor::new(1, 1, "hang")))),
            &p,
            &shutdown,
        );
        loop {
            let ev = events.recv().await.expect("bus open");
            if ev.kind == EventKind::TaskReceived {
                break;
            }
        }

        let started = Instant::now();
        epoch.drain().await;
        let took = started.elapsed();
        assert!(took >= Duration::from_secs(5) && took < Duration::from_secs(6), "took {took:?}");
        assert!(channel.closed.load(Ordering::SeqCst));

        let exceeded = loop {
            let ev = events.recv().await.expect("bus open");
            if ev.kind == EventKind::DrainGraceExceeded {
                break ev;
            }
        };
        assert_eq!(exceeded.epoch, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn workers_exiting_quietly_is_a_failure() {
        let channel = TestChannel::ready();
        let shutdown = CancellationToken::new();
        let mut epoch = Epoch::start(
            2,
            channel.clone(),
            Box::new(NullSink),
            Box::new(BlockedTasks(Arc::new(AtomicBool::new(false)))),
            &params(Arc::new(NoTelemetry)),
            &shutdown,
        );

        epoch.scope.cancel();
        let end = epoch.wait(&shutdown).await;
        assert!(matches!(end, EpochEnd::Failed(LinkError::WorkersExited)));
        assert!(!shutdown.is_cancelled());
        epoch.drain().await;
    }
}
