//! Text Codec
//!
//! Encoders and decoders for the four message shapes. Requests are two
//! whitespace-separated tokens, peer lists are comma-joined decimal ports, and
//! admission replies are a single literal token.

use super::types::*;

pub fn encode_register(port: u16) -> Vec<u8> {
    encode_request(REGISTER_TOKEN, port)
}

pub fn decode_register(bytes: &[u8]) -> Result<u16, ProtocolError> {
    decode_request(REGISTER_TOKEN, bytes)
}

pub fn encode_join(port: u16) -> Vec<u8> {
    encode_request(JOIN_TOKEN, port)
}

pub fn decode_join(bytes: &[u8]) -> Result<u16, ProtocolError> {
    decode_request(JOIN_TOKEN, bytes)
}

/// Encodes ports as `5001,5002,...`. An empty input yields an empty payload.
pub fn encode_peer_list<I>(ports: I) -> Vec<u8>
where
    I: IntoIterator<Item = u16>,
{
    ports
        .into_iter()
        .map(|port| port.to_string())
        .collect::<Vec<_>>()
        .join(",")
        .into_bytes()
}

/// Decodes a peer list, keeping wire order and dropping repeated ports.
pub fn decode_peer_list(bytes: &[u8]) -> Result<Vec<u16>, ProtocolError> {
    let text = as_text(bytes).map_err(ProtocolError::MalformedResponse)?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut ports: Vec<u16> = Vec::new();
    for token in text.split(',') {
        let port = token.trim().parse::<u16>().map_err(|_| {
            ProtocolError::MalformedResponse(format!("invalid port in peer list: {:?}", token))
        })?;

        if !ports.contains(&port) {
            ports.push(port);
        }
    }

    Ok(ports)
}

pub fn encode_reply(reply: JoinReply) -> Vec<u8> {
    reply.as_token().as_bytes().to_vec()
}

pub fn decode_reply(bytes: &[u8]) -> Result<JoinReply, ProtocolError> {
    let text = as_text(bytes).map_err(ProtocolError::MalformedResponse)?;

    match text.trim() {
        ALLOW_TOKEN => Ok(JoinReply::Allow),
        DENY_TOKEN => Ok(JoinReply::Deny),
        other => Err(ProtocolError::MalformedResponse(format!(
            "expected {} or {}, got {:?}",
            ALLOW_TOKEN, DENY_TOKEN, other
        ))),
    }
}

impl Request {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::Register { port } => encode_register(*port),
            Request::Join { port } => encode_join(*port),
        }
    }

    /// Decodes either request shape, dispatching on the leading token.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = as_text(bytes).map_err(ProtocolError::MalformedRequest)?;

        match text.split_whitespace().next() {
            Some(REGISTER_TOKEN) => decode_register(bytes).map(|port| Request::Register { port }),
            Some(JOIN_TOKEN) => decode_join(bytes).map(|port| Request::Join { port }),
            Some(other) => Err(ProtocolError::MalformedRequest(format!(
                "unknown request token {:?}",
                other
            ))),
            None => Err(ProtocolError::MalformedRequest("empty request".to_string())),
        }
    }
}

fn encode_request(token: &str, port: u16) -> Vec<u8> {
    format!("{} {}", token, port).into_bytes()
}

fn decode_request(token: &str, bytes: &[u8]) -> Result<u16, ProtocolError> {
    let text = as_text(bytes).map_err(ProtocolError::MalformedRequest)?;
    let mut parts = text.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(found), Some(port), None) if found == token => port.parse::<u16>().map_err(|_| {
            ProtocolError::MalformedRequest(format!("invalid port {:?} in {} request", port, token))
        }),
        _ => Err(ProtocolError::MalformedRequest(format!(
            "expected \"{} <port>\", got {:?}",
            token, text
        ))),
    }
}

fn as_text(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("payload is not valid UTF-8: {}", e))
}
