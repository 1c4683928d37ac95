//! Node Configuration
//!
//! Protocol constants shared by every node in the overlay, plus the
//! per-process [`NodeConfig`] the binary builds from its command line.

use crate::error::TapestryError;
use crate::identifier::Id;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Number of retries for a single RPC before the call is reported as failed.
pub const RETRIES: usize = 3;
/// How often a node re-advertises the objects it stores.
pub const REPUBLISH: Duration = Duration::from_secs(10);
/// How long a root keeps an advertisement that is not refreshed.
pub const TIMEOUT: Duration = Duration::from_secs(25);

/// Floor applied to every timer period, so a zero setting cannot spin or panic a loop.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

const REAP_INTERVAL: Duration = Duration::from_secs(1);
const RPC_TIMEOUT: Duration = Duration::from_millis(500);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
const RPC_BACKOFF: Duration = Duration::from_millis(50);
const RPC_BACKOFF_MAX: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interface the RPC listener binds to. Also used as the advertised host.
    pub bind_host: IpAddr,
    /// Listener port, `0` picks an ephemeral one.
    pub port: u16,
    /// Existing overlay member to join through.
    pub connect_to: Option<SocketAddr>,
    /// Fixed identifier for this node. Random when unset.
    pub id: Option<Id>,
    pub republish_interval: Duration,
    pub registration_timeout: Duration,
    /// Period of the directory's expiry sweep.
    pub reap_interval: Duration,
    pub rpc_retries: usize,
    /// Per-attempt timeout for peer RPCs.
    pub rpc_timeout: Duration,
    /// Delay before the first RPC retry; doubles on each further attempt.
    pub rpc_backoff: Duration,
    pub rpc_backoff_max: Duration,
    /// How long a graceful server shutdown may take before it is aborted.
    pub shutdown_grace: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            connect_to: None,
            id: None,
            republish_interval: REPUBLISH,
            registration_timeout: TIMEOUT,
            reap_interval: REAP_INTERVAL,
            rpc_retries: RETRIES,
            rpc_timeout: RPC_TIMEOUT,
            rpc_backoff: RPC_BACKOFF,
            rpc_backoff_max: RPC_BACKOFF_MAX,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

impl NodeConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }

    /// Rejects settings a node cannot run with: zero periods and no RPC attempts.
    pub fn validate(&self) -> Result<(), TapestryError> {
        let periods = [
            ("republish_interval", self.republish_interval),
            ("registration_timeout", self.registration_timeout),
            ("reap_interval", self.reap_interval),
            ("rpc_timeout", self.rpc_timeout),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, period)| period.is_zero()) {
            return Err(TapestryError::InvalidConfig(format!("{} must be non-zero", name)));
        }
        if self.rpc_retries == 0 {
            return Err(TapestryError::InvalidConfig(
                "rpc_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
