use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

/// A reachable node: listening host plus port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Which side of the handshake admitted a member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Admission {
    /// We approved their inbound `JOIN`.
    Inbound,
    /// They answered `ALLOW` to our outbound `JOIN`.
    Outbound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub endpoint: Endpoint,
    pub admission: Admission,

    #[serde(skip)]
    pub admitted_at: Option<Instant>,
}

/// A node's local, non-authoritative view of who is in the network.
///
/// Grows monotonically: there is no leave or failure-detection protocol, so entries
/// are never removed. Re-admitting a known endpoint keeps the first entry.
#[derive(Debug, Default)]
pub struct MembershipSet {
    members: DashMap<Endpoint, Member>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `endpoint`. Returns `true` if it was not already a member.
    pub fn insert(&self, endpoint: Endpoint, admission: Admission) -> bool {
        let mut inserted = false;

        self.members.entry(endpoint).or_insert_with(|| {
            inserted = true;
            Member {
                endpoint,
                admission,
                admitted_at: Some(Instant::now()),
            }
        });

        inserted
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.members.contains_key(endpoint)
    }

    pub fn contains_port(&self, port: u16) -> bool {
        self.members.iter().any(|entry| entry.key().port == port)
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<Member> {
        self.members.get(endpoint).map(|entry| entry.value().clone())
    }

    /// Snapshot of the current members, sorted by endpoint.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = self.members.iter().map(|entry| *entry.key()).collect();
        endpoints.sort_by_key(|endpoint| (endpoint.host, endpoint.port));
        endpoints
    }

    pub fn ports(&self) -> Vec<u16> {
        self.endpoints().into_iter().map(|endpoint| endpoint.port).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of one outbound `JOIN` handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JoinOutcome {
    Allowed,
    Denied,
    /// No explicit answer: refused connection, timeout, dropped or garbled exchange.
    Unreachable { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinAttemptResult {
    pub peer: Endpoint,
    pub outcome: JoinOutcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JoinVerdict {
    Admitted,
    Rejected,
}

/// Final verdict of a join run plus every attempt made before it was reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinReport {
    pub verdict: JoinVerdict,
    pub attempts: Vec<JoinAttemptResult>,
}

impl JoinReport {
    pub fn is_admitted(&self) -> bool {
        self.verdict == JoinVerdict::Admitted
    }

    /// Peers that answered `ALLOW`.
    pub fn allowed_by(&self) -> Vec<Endpoint> {
        self.attempts
            .iter()
            .filter(|attempt| attempt.outcome == JoinOutcome::Allowed)
            .map(|attempt| attempt.peer)
            .collect()
    }
}
