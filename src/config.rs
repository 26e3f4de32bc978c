//! Runtime Configuration
//!
//! Plain settings structs handed to the registry and peer services. The binary fills
//! them from command-line flags; tests build them directly.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_REGISTRY_PORT: u16 = 4000;

/// Bounds on every operation that waits on something outside this process.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// How long an admission gate waits for the decision function.
    pub decision: Duration,
    /// TCP connect bound for outbound requests (registry and join).
    pub connect: Duration,
    /// How long a joining node waits for a peer's `ALLOW`/`DENY`.
    /// Must exceed the remote side's decision bound.
    pub response: Duration,
    /// Server-side bound on reading a request and writing a reply.
    pub io: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            decision: Duration::from_secs(30),
            connect: Duration::from_secs(2),
            response: Duration::from_secs(60),
            io: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub bind_addr: SocketAddr,
    pub timeouts: Timeouts,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_REGISTRY_PORT),
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host the node listens on. Also the host assumed for every peer port the
    /// registry hands out.
    pub host: IpAddr,
    pub registry_addr: SocketAddr,
    pub timeouts: Timeouts,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            registry_addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_REGISTRY_PORT),
            timeouts: Timeouts::default(),
        }
    }
}
