//! # ConnectionSupervisor: the reconnect state machine.
//!
//! Owns the retry tracker, the event bus and the status registry, and drives one
//! epoch at a time against the collector.
//!
//! ```text
//! Disconnected ─► Dialing ──ok──► Registering ──ok──► Streaming ──worker ends──► Draining
//!                   ▲   │                │                                          │
//!                   │  err              err                              both joined, closed
//!                   │   ▼                ▼                                          ▼
//!                   └── Backoff ◄────────┴──────────────────────────────────────────┘
//!                       record_failure → delay(min(attempt, max_retries)) → sleep
//! ```
//!
//! ## Rules
//! - Registration success resets the retry count; every session end counts as a failure.
//! - At most one epoch is live: the next dial starts only after `Epoch::drain` returns.
//! - Past `max_retries` the delay stays clamped and reconnecting never stops;
//!   `RetryCeilingExceeded` is published and the status reports persistent failure.
//! - The shutdown token is honoured at every suspension point (dial, register,
//!   stream open, epoch wait, backoff sleep). Stopping is not a failure.
//!
//! ## Event flow
//! ```text
//! Dialing → Connected | DialFailed
//! Registered | RegistrationFailed
//! EpochStarted → (TaskReceived, TaskCompleted, SnapshotSkipped)* → EpochEnded
//! BackoffScheduled [+ RetryCeilingExceeded]
//! ShutdownRequested → SupervisorStopped
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::select;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::core::epoch::{Epoch, EpochEnd, EpochParams};
use crate::core::retry::RetryTracker;
use crate::core::shutdown;
use crate::core::status::{Phase, StatusRegistry};
use crate::error::{LinkError, StreamKind};
use crate::events::{Bus, Event, EventKind};
use crate::model::HostInfo;
use crate::subscribers::SubscriberSet;
use crate::transport::{Channel, SessionDialer, StateSink, TaskStream};

/// Keeps one collector session alive for the lifetime of the process.
///
/// Built with [`ConnectionSupervisor::builder`].
pub struct ConnectionSupervisor {
    pub(crate) cfg: SupervisorConfig,
    pub(crate) dialer: SessionDialer,
    pub(crate) host: HostInfo,
    pub(crate) params: EpochParams,
    pub(crate) bus: Bus,
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) status: Arc<StatusRegistry>,
    pub(crate) retry: RetryTracker,
    pub(crate) next_epoch: u64,
}

impl ConnectionSupervisor {
    /// Status handle for health checks. Stays valid after `run` returns.
    pub fn status(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.status)
    }

    /// Event bus; receivers see events published after they subscribe.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the reconnect loop until `shutdown` is cancelled.
    ///
    /// Never returns on its own: every failure is recorded and retried.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let listener_done = CancellationToken::new();
        let listener = self.subscriber_listener(listener_done.clone());

        loop {
            let err = match self.session(&shutdown).await {
                EpochEnd::Stopped => break,
                EpochEnd::Failed(err) => err,
            };
            if self.back_off(&err, &shutdown).await.is_break() {
                break;
            }
        }

        self.status.detach().await;
        self.status.set_phase(Phase::Disconnected).await;
        self.bus.publish(Event::new(EventKind::SupervisorStopped));

        listener_done.cancel();
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(self.subs) {
            set.shutdown().await;
        }
    }

    /// Runs until SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows).
    pub async fn run_until_signal(self) {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        let signals = tokio::spawn(async move {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(()) => trigger.cancel(),
                Err(e) => tracing::error!(error = %e, "cannot install signal handlers"),
            }
        });

        self.run(shutdown).await;
        signals.abort();
    }

    /// One pass through Dialing → Registering → Streaming → Draining.
    async fn session(&mut self, shutdown: &CancellationToken) -> EpochEnd {
        let address = self.dialer.address().to_owned();
        self.status.set_phase(Phase::Dialing).await;
        self.bus
            .publish(Event::new(EventKind::Dialing).with_address(address.as_str()));

        let dialed = select! {
            biased;
            _ = shutdown.cancelled() => {
                self.announce_stop();
                return EpochEnd::Stopped;
            }
            r = self.dialer.dial() => r,
        };
        let channel = match dialed {
            Ok(channel) => channel,
            Err(err) => {
                self.bus.publish(
                    Event::new(EventKind::DialFailed)
                        .with_address(address.as_str())
                        .with_error(&err),
                );
                return EpochEnd::Failed(err);
            }
        };
        self.bus
            .publish(Event::new(EventKind::Connected).with_address(address.as_str()));
        self.status.attach_channel(Arc::clone(&channel)).await;

        let registered = select! {
            biased;
            _ = shutdown.cancelled() => return self.abandon(&channel, EpochEnd::Stopped).await,
            r = self.dialer.register(channel.as_ref(), &self.host) => r,
        };
        match registered {
            Ok(receipt) => {
                self.retry.record_success();
                self.status.set_retry(self.retry.snapshot()).await;
                self.bus
                    .publish(Event::new(EventKind::Registered).with_receipt(receipt.0));
            }
            Err(err) => {
                self.bus
                    .publish(Event::new(EventKind::RegistrationFailed).with_error(&err));
                return self.abandon(&channel, EpochEnd::Failed(err)).await;
            }
        }

        let opened = select! {
            biased;
            _ = shutdown.cancelled() => return self.abandon(&channel, EpochEnd::Stopped).await,
            r = open_streams(channel.as_ref()) => r,
        };
        let (sink, stream) = match opened {
            Ok(streams) => streams,
            Err(err) => return self.abandon(&channel, EpochEnd::Failed(err)).await,
        };

        self.next_epoch += 1;
        let mut epoch = Epoch::start(
            self.next_epoch,
            Arc::clone(&channel),
            sink,
            stream,
            &self.params,
            shutdown,
        );
        let id = epoch.id();
        self.status.epoch_started(id).await;
        self.bus
            .publish(Event::new(EventKind::EpochStarted).with_epoch(id));

        let end = epoch.wait(shutdown).await;
        if matches!(end, EpochEnd::Stopped) {
            self.announce_stop();
        }

        self.status.set_phase(Phase::Draining).await;
        epoch.drain().await;
        self.status.detach().await;

        let mut ended = Event::new(EventKind::EpochEnded).with_epoch(id);
        if let EpochEnd::Failed(err) = &end {
            ended = ended.with_error(err);
        }
        self.bus.publish(ended);
        end
    }

    /// Records the failure and sleeps the backoff delay; breaks if shutdown interrupts it.
    async fn back_off(&mut self, err: &LinkError, shutdown: &CancellationToken) -> ControlFlow<()> {
        let attempt = self.retry.record_failure(err);
        self.status.set_retry(self.retry.snapshot()).await;
        self.status.set_phase(Phase::Backoff).await;

        if self.retry.ceiling_exceeded() {
            self.bus.publish(
                Event::new(EventKind::RetryCeilingExceeded)
                    .with_attempt(attempt)
                    .with_error(err),
            );
        }

        let delay = self.cfg.backoff.delay(self.cfg.backoff_attempt(attempt));
        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_attempt(attempt)
                .with_delay(delay)
                .with_error(err),
        );

        select! {
            biased;
            _ = shutdown.cancelled() => {
                self.announce_stop();
                ControlFlow::Break(())
            }
            _ = time::sleep(delay) => ControlFlow::Continue(()),
        }
    }

    /// Closes a channel that never made it to an epoch.
    async fn abandon(&self, channel: &Arc<dyn Channel>, end: EpochEnd) -> EpochEnd {
        if matches!(end, EpochEnd::Stopped) {
            self.announce_stop();
        }
        channel.close().await;
        self.status.detach().await;
        end
    }

    fn announce_stop(&self) {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
    }

    /// Forwards bus events to the subscriber set until `done`, then drains what is buffered.
    fn subscriber_listener(&self, done: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => break,
                }
            }
        })
    }
}

/// Opens the state stream and the task stream; either failure is a stream error.
async fn open_streams(
    channel: &dyn Channel,
) -> Result<(Box<dyn StateSink>, Box<dyn TaskStream>), LinkError> {
    let sink = channel
        .open_state_stream()
        .await
        .map_err(|source| LinkError::Stream {
            stream: StreamKind::State,
            source,
        })?;
    let stream = channel
        .open_task_stream()
        .await
        .map_err(|source| LinkError::Stream {
            stream: StreamKind::Task,
            source,
        })?;
    Ok((sink, stream))
}
