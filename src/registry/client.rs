use crate::config::Timeouts;
use crate::error::MembershipError;
use crate::protocol::Request;
use crate::protocol::codec::decode_peer_list;
use crate::protocol::transport::exchange;

use std::net::SocketAddr;

/// Registers `my_port` with the registry at `registry_addr` and returns the ports of
/// every other registered peer.
pub async fn discover_peers(
    registry_addr: SocketAddr,
    my_port: u16,
    timeouts: &Timeouts,
) -> Result<Vec<u16>, MembershipError> {
    tracing::debug!("Registering port {} with registry {}", my_port, registry_addr);

    let response = exchange(
        registry_addr,
        &Request::Register { port: my_port }.encode(),
        timeouts.connect,
        timeouts.io,
    )
    .await?;
    let peers = decode_peer_list(&response)?;

    tracing::info!("Registry {} returned {} peer(s)", registry_addr, peers.len());

    Ok(peers)
}
