use super::types::{RegistryTable, now_ms};
use crate::error::MembershipError;
use crate::listener::ConnectionHandler;
use crate::protocol::codec::encode_peer_list;
use crate::protocol::transport::{read_request, write_message};
use crate::protocol::{ProtocolError, Request};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Rendezvous point that new peers contact to learn who is already in the network.
///
/// The table is guarded by a single mutex. Insertion and the filtered read happen in
/// the same critical section, so every peer list is a consistent snapshot.
#[derive(Debug, Default)]
pub struct BootstrapRegistry {
    table: Mutex<RegistryTable>,
}

impl BootstrapRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `port` (idempotent) and returns every other registered port.
    pub async fn register(&self, port: u16) -> Vec<u16> {
        let mut table = self.table.lock().await;

        if table.insert(port, now_ms()) {
            tracing::info!("Registered peer {} (registry size: {})", port, table.len());
        } else {
            tracing::debug!("Peer {} re-registered", port);
        }

        table.others(port)
    }

    pub async fn contains(&self, port: u16) -> bool {
        self.table.lock().await.get(port).is_some()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }

    /// Every registered port, in registration order.
    pub async fn members(&self) -> Vec<u16> {
        self.table.lock().await.ports()
    }
}

/// Serves `REGISTER` requests over TCP for a shared [`BootstrapRegistry`].
pub struct RegistryService {
    registry: Arc<BootstrapRegistry>,
    io_timeout: Duration,
}

impl RegistryService {
    pub fn new(registry: Arc<BootstrapRegistry>, io_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry,
            io_timeout,
        })
    }

    pub fn registry(&self) -> &Arc<BootstrapRegistry> {
        &self.registry
    }

    async fn serve_request(
        &self,
        stream: &mut TcpStream,
        peer: SocketAddr,
    ) -> Result<(), MembershipError> {
        let port = match Request::decode(&read_request(stream, peer, self.io_timeout).await?)? {
            Request::Register { port } => port,
            Request::Join { .. } => {
                return Err(ProtocolError::MalformedRequest(
                    "JOIN sent to the registry".to_string(),
                )
                .into());
            }
        };

        let others = self.registry.register(port).await;
        tracing::debug!("Sending {} known peer(s) to {}", others.len(), port);

        write_message(stream, peer, &encode_peer_list(others), self.io_timeout).await
    }
}

impl ConnectionHandler for RegistryService {
    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = self.serve_request(&mut stream, peer).await {
            tracing::warn!("Dropped registry session with {}: {}", peer, e);
        }
    }
}
