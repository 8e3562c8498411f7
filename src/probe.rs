//! # Collector reachability probe.
//!
//! Resolves the host part of `host:port`, then opens (and drops) one TCP
//! connection, trying resolved addresses in order. Used by the
//! `agentlink-probe` binary; independent of the supervisor.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use tokio::net::{TcpStream, lookup_host};
use tokio::time;

use crate::config::split_host_port;
use crate::error::ProbeError;

/// Default bound on the TCP connect phase.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a successful probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub host: String,
    pub resolved: Vec<SocketAddr>,
    /// First address that accepted a connection.
    pub connected: SocketAddr,
}

/// Checks DNS resolution and TCP reachability of `address`.
///
/// `timeout` bounds the whole connect phase, across all resolved addresses.
pub async fn probe(address: &str, timeout: Duration) -> Result<ProbeReport, ProbeError> {
    let (host, port) = split_host_port(address)?;

    let resolved: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();
    tracing::debug!(host, addrs = resolved.len(), "dns lookup done");

    let connected = time::timeout(timeout, connect_any(host, &resolved))
        .await
        .map_err(|_elapsed| ProbeError::ConnectTimeout {
            address: address.to_string(),
            timeout,
        })??;

    Ok(ProbeReport {
        host: host.to_string(),
        resolved,
        connected,
    })
}

/// Tries each address in order; returns the first that connects, or the
/// error of the last address tried, naming that address.
async fn connect_any(host: &str, addrs: &[SocketAddr]) -> Result<SocketAddr, ProbeError> {
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(_stream) => return Ok(*addr),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "tcp connect failed");
                last_err = Some((*addr, e));
            }
        }
    }
    match last_err {
        Some((addr, source)) => Err(ProbeError::Connect {
            address: addr.to_string(),
            source,
        }),
        None => Err(ProbeError::NoAddresses {
            host: host.to_string(),
        }),
    }
}
