use super::decision::Decision;
use super::gate::AdmissionGate;
use super::orchestrator::JoinOrchestrator;
use super::status::{StatusEvent, StatusSink};
use super::types::{Endpoint, JoinReport, MembershipSet};
use crate::config::NodeConfig;
use crate::listener::ConnectionListener;
use crate::registry::discover_peers;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running peer: its admission gate is serving, and it has tried to join.
///
/// The gate keeps answering `JOIN` requests for as long as the service lives,
/// whatever the verdict of its own join was. Dropping the service stops the gate
/// without waiting for it; [`MembershipService::shutdown`] waits.
pub struct MembershipService {
    pub local_node: Endpoint,
    pub members: Arc<MembershipSet>,
    report: JoinReport,
    listener: JoinHandle<()>,
}

impl MembershipService {
    /// Startup sequence:
    ///
    /// 1. Bind `host:0` and spawn the admission gate on the OS-assigned port.
    /// 2. Register that port with the registry and collect the other peers.
    /// 3. Ask each of them for admission.
    ///
    /// Failing to reach the registry is an error; a denial is not (see [`Self::report`]).
    pub async fn start(
        config: NodeConfig,
        decision: Decision,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        let listener = ConnectionListener::bind(SocketAddr::new(config.host, 0)).await?;
        let local_node = Endpoint::from(listener.local_addr());
        sink.notify(&StatusEvent::Listening {
            endpoint: local_node,
        });

        let members = Arc::new(MembershipSet::new());
        let gate = AdmissionGate::new(members.clone(), decision, sink.clone(), config.timeouts);
        let listener = listener.spawn(gate);

        let candidates =
            match discover_peers(config.registry_addr, local_node.port, &config.timeouts).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    listener.abort();
                    return Err(anyhow::Error::new(e).context(format!(
                        "Failed to register with registry {}",
                        config.registry_addr
                    )));
                }
            };
        sink.notify(&StatusEvent::PeersDiscovered {
            peers: candidates.clone(),
        });

        let orchestrator =
            JoinOrchestrator::new(local_node, members.clone(), sink.clone(), config.timeouts);
        let report = orchestrator.join_network(&candidates).await;

        tracing::info!(
            "Node {} finished joining: {:?} after {} attempt(s)",
            local_node,
            report.verdict,
            report.attempts.len()
        );

        Ok(Self {
            local_node,
            members,
            report,
            listener,
        })
    }

    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    pub fn is_admitted(&self) -> bool {
        self.report.is_admitted()
    }

    pub fn local_port(&self) -> u16 {
        self.local_node.port
    }

    /// Stops the admission gate: the listening socket is closed and in-flight join
    /// sessions, pending decisions included, are cancelled before this returns.
    pub async fn shutdown(mut self) {
        tracing::info!("Stopping admission gate on {}", self.local_node);

        self.listener.abort();
        if let Err(e) = (&mut self.listener).await
            && e.is_panic()
        {
            tracing::error!("Admission gate on {} panicked: {}", self.local_node, e);
        }
    }
}

impl Drop for MembershipService {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
