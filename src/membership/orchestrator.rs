//! Join Orchestrator
//!
//! Outbound side of the join handshake. Candidates from the registry are asked one at
//! a time, in the order given (which callers must treat as arbitrary):
//!
//! 1. Unreachable peers (refused, timed out, dropped, garbled reply) are skipped.
//! 2. `ALLOW` adds the peer to the membership set and moves on.
//! 3. `DENY` stops immediately with [`JoinVerdict::Rejected`].
//!
//! Peers that allowed us before a denial stay in the set. An empty candidate list is
//! admitted vacuously.

use super::status::{StatusEvent, StatusSink};
use super::types::{
    Admission, Endpoint, JoinAttemptResult, JoinOutcome, JoinReport, JoinVerdict, MembershipSet,
};
use crate::config::Timeouts;
use crate::error::MembershipError;
use crate::protocol::{JoinReply, Request};
use crate::protocol::codec::decode_reply;
use crate::protocol::transport::exchange;

use std::sync::Arc;

pub struct JoinOrchestrator {
    local: Endpoint,
    membership: Arc<MembershipSet>,
    sink: Arc<dyn StatusSink>,
    timeouts: Timeouts,
}

impl JoinOrchestrator {
    /// `local` is this node's listening endpoint. Its host is also used for every
    /// candidate port, since the registry hands out ports only.
    pub fn new(
        local: Endpoint,
        membership: Arc<MembershipSet>,
        sink: Arc<dyn StatusSink>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            local,
            membership,
            sink,
            timeouts,
        }
    }

    pub async fn join_network(&self, candidates: &[u16]) -> JoinReport {
        let mut attempts = Vec::with_capacity(candidates.len());

        if candidates.is_empty() {
            tracing::info!("No existing peers, admitted as first member");
        }

        for &port in candidates {
            if port == self.local.port {
                tracing::debug!("Skipping own port {} in candidate list", port);
                continue;
            }

            let peer = Endpoint::new(self.local.host, port);
            let outcome = self.attempt_join(peer).await;

            match &outcome {
                JoinOutcome::Allowed => {
                    self.membership.insert(peer, Admission::Outbound);
                    self.sink.notify(&StatusEvent::JoinAllowed { peer });
                }
                JoinOutcome::Denied => {
                    self.sink.notify(&StatusEvent::JoinDenied { peer });
                }
                JoinOutcome::Unreachable { reason } => {
                    self.sink.notify(&StatusEvent::PeerUnreachable {
                        peer,
                        reason: reason.clone(),
                    });
                }
            }

            let denied = outcome == JoinOutcome::Denied;
            attempts.push(JoinAttemptResult { peer, outcome });

            if denied {
                self.sink.notify(&StatusEvent::Rejected { denied_by: peer });
                return JoinReport {
                    verdict: JoinVerdict::Rejected,
                    attempts,
                };
            }
        }

        self.sink.notify(&StatusEvent::Admitted {
            members: self.membership.endpoints(),
        });

        JoinReport {
            verdict: JoinVerdict::Admitted,
            attempts,
        }
    }

    /// Runs one `JOIN` handshake. Anything short of an explicit reply is `Unreachable`.
    pub async fn attempt_join(&self, peer: Endpoint) -> JoinOutcome {
        match self.request_admission(peer).await {
            Ok(JoinReply::Allow) => JoinOutcome::Allowed,
            Ok(JoinReply::Deny) => JoinOutcome::Denied,
            Err(e) => {
                tracing::debug!("Join attempt against {} failed: {}", peer, e);
                JoinOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn request_admission(&self, peer: Endpoint) -> Result<JoinReply, MembershipError> {
        tracing::debug!("Sending JOIN {} to {}", self.local.port, peer);

        let response = exchange(
            peer.socket_addr(),
            &Request::Join {
                port: self.local.port,
            }
            .encode(),
            self.timeouts.connect,
            self.timeouts.response,
        )
        .await?;

        Ok(decode_reply(&response)?)
    }
}
