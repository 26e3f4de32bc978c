//! Status Reporting
//!
//! Human-facing progress of a node (join requests received, denials, the final
//! verdict) goes through a [`StatusSink`]. The core only emits [`StatusEvent`]s;
//! how they are shown is up to the sink.

use super::types::Endpoint;
use crate::protocol::JoinReply;

use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    Listening { endpoint: Endpoint },
    PeersDiscovered { peers: Vec<u16> },
    JoinRequestReceived { requester: Endpoint },
    JoinRequestDecided { requester: Endpoint, reply: JoinReply },
    JoinAllowed { peer: Endpoint },
    JoinDenied { peer: Endpoint },
    PeerUnreachable { peer: Endpoint, reason: String },
    Admitted { members: Vec<Endpoint> },
    Rejected { denied_by: Endpoint },
}

pub trait StatusSink: Send + Sync {
    fn notify(&self, event: &StatusEvent);
}

/// Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn notify(&self, event: &StatusEvent) {
        match event {
            StatusEvent::Listening { endpoint } => {
                tracing::info!("My peer is running on {}", endpoint);
            }
            StatusEvent::PeersDiscovered { peers } => {
                tracing::info!("Discovered {} peer(s): {:?}", peers.len(), peers);
            }
            StatusEvent::JoinRequestReceived { requester } => {
                tracing::info!("Join request from peer {}", requester);
            }
            StatusEvent::JoinRequestDecided { requester, reply } => {
                tracing::info!("Answered {} to peer {}", reply.as_token(), requester);
            }
            StatusEvent::JoinAllowed { peer } => {
                tracing::info!("Peer {} allowed us in", peer);
            }
            StatusEvent::JoinDenied { peer } => {
                tracing::warn!("Join denied by peer {}", peer);
            }
            StatusEvent::PeerUnreachable { peer, reason } => {
                tracing::warn!("Peer {} not reachable: {}", peer, reason);
            }
            StatusEvent::Admitted { members } => {
                tracing::info!("Welcome to network ({} member(s) known)", members.len());
            }
            StatusEvent::Rejected { denied_by } => {
                tracing::error!("Failed to join network: denied by {}", denied_by);
            }
        }
    }
}

/// Writes one JSON object per event to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesSink;

impl StatusSink for JsonLinesSink {
    fn notify(&self, event: &StatusEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", line) {
                    tracing::warn!("Failed to write status event: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize status event: {}", e),
        }
    }
}
