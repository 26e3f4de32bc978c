//! Admission Gate
//!
//! Inbound side of the join handshake. Each `JOIN <port>` connection is answered
//! exactly once with `ALLOW` or `DENY` and then closed. Approved requesters are added
//! to the node's [`MembershipSet`].
//!
//! The decision runs on its own task under a timeout. A decision that fails, panics,
//! or takes too long counts as a denial, so a requester is never left hanging.

use super::decision::Decision;
use super::status::{StatusEvent, StatusSink};
use super::types::{Admission, Endpoint, MembershipSet};
use crate::config::Timeouts;
use crate::error::MembershipError;
use crate::listener::ConnectionHandler;
use crate::protocol::codec::encode_reply;
use crate::protocol::transport::{read_request, write_message};
use crate::protocol::{JoinReply, ProtocolError, Request};

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

pub struct AdmissionGate {
    membership: Arc<MembershipSet>,
    decision: Decision,
    sink: Arc<dyn StatusSink>,
    timeouts: Timeouts,
}

impl AdmissionGate {
    pub fn new(
        membership: Arc<MembershipSet>,
        decision: Decision,
        sink: Arc<dyn StatusSink>,
        timeouts: Timeouts,
    ) -> Arc<Self> {
        Arc::new(Self {
            membership,
            decision,
            sink,
            timeouts,
        })
    }

    pub fn membership(&self) -> &Arc<MembershipSet> {
        &self.membership
    }

    /// Decides on one join request and records the requester if admitted.
    pub async fn handle_join_request(&self, requester: Endpoint) -> JoinReply {
        self.sink.notify(&StatusEvent::JoinRequestReceived { requester });

        let allowed = match self.decide(requester.port).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!("Denying {} after failed decision: {}", requester, e);
                false
            }
        };

        if allowed && self.membership.insert(requester, Admission::Inbound) {
            tracing::info!(
                "Admitted {} (membership size: {})",
                requester,
                self.membership.len()
            );
        }

        let reply = JoinReply::from(allowed);
        self.sink.notify(&StatusEvent::JoinRequestDecided { requester, reply });

        reply
    }

    async fn decide(&self, port: u16) -> Result<bool> {
        let decision = self.decision.clone();
        // Dropping the set aborts the decision, whether it timed out or the session was cancelled
        let mut task = JoinSet::new();
        task.spawn(async move { decision.decide(port).await });

        match tokio::time::timeout(self.timeouts.decision, task.join_next()).await {
            Ok(Some(Ok(result))) => result,
            Ok(Some(Err(e))) => Err(anyhow::anyhow!("decision task failed: {}", e)),
            Ok(None) => Err(anyhow::anyhow!("decision task was never started")),
            Err(_) => Err(MembershipError::DecisionTimeout {
                port,
                after: self.timeouts.decision,
            }
            .into()),
        }
    }

    async fn serve_request(
        &self,
        stream: &mut TcpStream,
        peer: SocketAddr,
    ) -> Result<JoinReply, MembershipError> {
        let port = match Request::decode(&read_request(stream, peer, self.timeouts.io).await?)? {
            Request::Join { port } => port,
            Request::Register { .. } => {
                return Err(ProtocolError::MalformedRequest(
                    "REGISTER sent to an admission gate".to_string(),
                )
                .into());
            }
        };

        let reply = self.handle_join_request(Endpoint::new(peer.ip(), port)).await;

        write_message(stream, peer, &encode_reply(reply), self.timeouts.io).await?;

        Ok(reply)
    }
}

impl ConnectionHandler for AdmissionGate {
    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) {
        match self.serve_request(&mut stream, peer).await {
            Ok(reply) => {
                tracing::debug!("Sent {} to {}", reply.as_token(), peer);
            }
            Err(e) => {
                tracing::warn!("Dropped join session with {}: {}", peer, e);
            }
        }
    }
}
