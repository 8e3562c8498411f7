use std::sync::Arc;

use crate::{
    config::{SessionConfig, SupervisorConfig},
    core::{epoch::EpochParams, retry::RetryTracker, status::StatusRegistry},
    error::ConfigError,
    events::Bus,
    handlers::{Acknowledge, NoTelemetry, SnapshotSource, TaskExecutor},
    model::HostInfo,
    subscribers::{LogWriter, Subscribe, SubscriberSet},
    transport::{Credentials, DialTarget, Dialer, SessionDialer},
};

use super::supervisor::ConnectionSupervisor;

/// Builder for a [`ConnectionSupervisor`].
///
/// Defaults: [`SupervisorConfig::default`], empty [`HostInfo`], no telemetry,
/// [`Acknowledge`] as task executor, credentials from the session identity, and
/// a single [`LogWriter`] subscriber.
pub struct SupervisorBuilder {
    session: SessionConfig,
    dialer: Arc<dyn Dialer>,
    cfg: SupervisorConfig,
    host: HostInfo,
    source: Arc<dyn SnapshotSource>,
    executor: Arc<dyn TaskExecutor>,
    credentials: Option<Arc<dyn Credentials>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ConnectionSupervisor {
    /// Starts building a supervisor for `session` over `dialer`.
    pub fn builder(session: SessionConfig, dialer: Arc<dyn Dialer>) -> SupervisorBuilder {
        SupervisorBuilder::new(session, dialer)
    }
}

impl SupervisorBuilder {
    pub fn new(session: SessionConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            session,
            dialer,
            cfg: SupervisorConfig::default(),
            host: HostInfo::default(),
            source: Arc::new(NoTelemetry),
            executor: Arc::new(Acknowledge),
            credentials: None,
            subscribers: vec![Arc::new(LogWriter::new())],
        }
    }

    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Host description sent at every registration.
    pub fn with_host_info(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    pub fn with_snapshot_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replaces the identity-derived per-call credentials.
    pub fn with_credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replaces the subscriber list (the default [`LogWriter`] included).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the session and assembles the supervisor.
    ///
    /// Spawns the subscriber workers, so it must be called inside a Tokio runtime.
    pub fn build(self) -> Result<ConnectionSupervisor, ConfigError> {
        self.session.validate()?;

        let mut target = DialTarget::from_session(&self.session);
        if let Some(credentials) = self.credentials {
            target = target.with_credentials(credentials);
        }
        let dialer = SessionDialer::new(
            self.dialer,
            target,
            self.cfg.dial_timeout,
            self.cfg.register_timeout,
        );

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let params = EpochParams {
            report_interval: self.session.report_interval,
            health_check_interval: self.cfg.health_check_interval,
            drain_grace: self.cfg.drain_grace,
            source: self.source,
            executor: self.executor,
            bus: bus.clone(),
        };

        Ok(ConnectionSupervisor {
            retry: RetryTracker::new(self.cfg.max_retries),
            cfg: self.cfg,
            dialer,
            host: self.host,
            params,
            bus,
            subs,
            status: Arc::new(StatusRegistry::new()),
            next_epoch: 0,
        })
    }
}
