//! # Dialing and registration with timeouts.
//!
//! [`Dialer`] is the transport collaborator: given a [`DialTarget`] it opens one
//! [`Channel`]. TLS and credential plumbing live behind it.
//!
//! [`SessionDialer`] is the core's side of that boundary. It bounds both network
//! steps and maps their failures into [`LinkError`]:
//! ```text
//! dial(target)          ── timeout(dial_timeout)     ──► Dial / DialTimeout
//! report_host_info(..)  ── timeout(register_timeout) ──► Registration / RegistrationTimeout
//! ```
//! Timing out drops the in-flight future, which cancels the call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use crate::config::{Keepalive, SessionConfig, TlsMode};
use crate::error::{LinkError, TransportError};
use crate::model::{HostInfo, RegistrationReceipt};
use crate::transport::channel::Channel;
use crate::transport::credentials::{Credentials, SecretAuth};

/// Everything a transport needs to open a channel.
#[derive(Clone)]
pub struct DialTarget {
    /// `host:port`.
    pub address: String,
    pub tls: TlsMode,
    pub keepalive: Keepalive,
    pub credentials: Arc<dyn Credentials>,
}

impl DialTarget {
    /// Builds a target from session config, authenticating with the session identity.
    pub fn from_session(cfg: &SessionConfig) -> Self {
        Self {
            address: cfg.server.clone(),
            tls: cfg.tls,
            keepalive: cfg.keepalive,
            credentials: Arc::new(SecretAuth::from(&cfg.identity)),
        }
    }

    /// Replaces the per-call credential provider.
    pub fn with_credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Opens channels to the collector.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, target: &DialTarget) -> Result<Arc<dyn Channel>, TransportError>;
}

/// Timeout-bounded dial + register.
#[derive(Clone)]
pub struct SessionDialer {
    dialer: Arc<dyn Dialer>,
    target: DialTarget,
    dial_timeout: Duration,
    register_timeout: Duration,
}

impl SessionDialer {
    pub fn new(
        dialer: Arc<dyn Dialer>,
        target: DialTarget,
        dial_timeout: Duration,
        register_timeout: Duration,
    ) -> Self {
        Self {
            dialer,
            target,
            dial_timeout,
            register_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.target.address
    }

    /// Opens one channel, bounded by the dial timeout.
    pub async fn dial(&self) -> Result<Arc<dyn Channel>, LinkError> {
        match time::timeout(self.dial_timeout, self.dialer.dial(&self.target)).await {
            Ok(Ok(channel)) => Ok(channel),
            Ok(Err(source)) => Err(LinkError::Dial {
                address: self.target.address.clone(),
                source,
            }),
            Err(_elapsed) => Err(LinkError::DialTimeout {
                address: self.target.address.clone(),
                timeout: self.dial_timeout,
            }),
        }
    }

    /// Reports host info on `channel`, bounded by the registration timeout.
    pub async fn register(
        &self,
        channel: &dyn Channel,
        host: &HostInfo,
    ) -> Result<RegistrationReceipt, LinkError> {
        match time::timeout(self.register_timeout, channel.report_host_info(host)).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(source)) => Err(LinkError::Registration { source }),
            Err(_elapsed) => Err(LinkError::RegistrationTimeout {
                timeout: self.register_timeout,
            }),
        }
    }
}
