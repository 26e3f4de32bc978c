//! Bounded Message Transport
//!
//! Helpers for the one-exchange-per-connection transport. Every read and write is
//! wrapped in a timeout, and reads stop one byte past [`MAX_MESSAGE_BYTES`] so an
//! oversized message is detected without buffering it.
//!
//! Responders take the request from a single bounded read, so a requester may keep its
//! write side open while it waits. Requesters read the reply to EOF, since the
//! responder always closes after writing.

use super::MAX_MESSAGE_BYTES;
use super::types::ProtocolError;
use crate::error::MembershipError;

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Reads a request with one bounded read. Does not wait for the peer's half-close.
pub async fn read_request<R>(
    reader: &mut R,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Vec<u8>, MembershipError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; MAX_MESSAGE_BYTES + 1];

    let n = tokio::time::timeout(timeout, reader.read(&mut buf))
        .await
        .map_err(|_| MembershipError::Timeout {
            addr,
            stage: "read",
            after: timeout,
        })?
        .map_err(|e| MembershipError::connection(addr, e))?;

    if n > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            limit: MAX_MESSAGE_BYTES,
        }
        .into());
    }

    buf.truncate(n);
    Ok(buf)
}

/// Reads one complete message (everything up to the peer's half-close).
pub async fn read_message<R>(
    reader: &mut R,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Vec<u8>, MembershipError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(64);
    let mut limited = reader.take(MAX_MESSAGE_BYTES as u64 + 1);

    tokio::time::timeout(timeout, limited.read_to_end(&mut buf))
        .await
        .map_err(|_| MembershipError::Timeout {
            addr,
            stage: "read",
            after: timeout,
        })?
        .map_err(|e| MembershipError::connection(addr, e))?;

    if buf.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            limit: MAX_MESSAGE_BYTES,
        }
        .into());
    }

    Ok(buf)
}

/// Writes one message and shuts down the write half, signalling end-of-message.
pub async fn write_message<W>(
    writer: &mut W,
    addr: SocketAddr,
    payload: &[u8],
    timeout: Duration,
) -> Result<(), MembershipError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            limit: MAX_MESSAGE_BYTES,
        }
        .into());
    }

    let write = async {
        writer.write_all(payload).await?;
        writer.flush().await?;
        writer.shutdown().await
    };

    tokio::time::timeout(timeout, write)
        .await
        .map_err(|_| MembershipError::Timeout {
            addr,
            stage: "write",
            after: timeout,
        })?
        .map_err(|e| MembershipError::connection(addr, e))
}

pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<TcpStream, MembershipError> {
    tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| MembershipError::Timeout {
            addr,
            stage: "connect",
            after: timeout,
        })?
        .map_err(|e| MembershipError::connection(addr, e))
}

/// Opens a connection, sends `request`, and waits for the full response.
///
/// The stream is dropped (closed) on every return path.
pub async fn exchange(
    addr: SocketAddr,
    request: &[u8],
    connect_timeout: Duration,
    response_timeout: Duration,
) -> Result<Vec<u8>, MembershipError> {
    let mut stream = connect(addr, connect_timeout).await?;

    write_message(&mut stream, addr, request, response_timeout).await?;
    let response = read_message(&mut stream, addr, response_timeout).await?;

    tracing::trace!("Exchanged {} / {} bytes with {}", request.len(), response.len(), addr);

    Ok(response)
}
