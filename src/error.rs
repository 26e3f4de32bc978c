//! Error Types
//!
//! Per-connection failures raised by the transport, the registry client, and the
//! admission logic. None of these escape a connection task; callers either log them
//! or fold them into a join outcome.

use crate::protocol::ProtocolError;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MembershipError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Connection error with {addr}: {source}")]
    Connection {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out during {stage} with {addr} after {after:?}")]
    Timeout {
        addr: SocketAddr,
        stage: &'static str,
        after: Duration,
    },

    #[error("No admission decision for peer {port} within {after:?}")]
    DecisionTimeout { port: u16, after: Duration },
}

impl MembershipError {
    pub fn connection(addr: SocketAddr, source: std::io::Error) -> Self {
        MembershipError::Connection { addr, source }
    }
}
