use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REGISTER_TOKEN: &str = "REGISTER";
pub const JOIN_TOKEN: &str = "JOIN";
pub const ALLOW_TOKEN: &str = "ALLOW";
pub const DENY_TOKEN: &str = "DENY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Message exceeds {limit} bytes")]
    MessageTooLarge { limit: usize },
}

/// A request as it arrives on either the registry or a peer listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// `REGISTER <port>`: announce a peer's listening port to the registry.
    Register { port: u16 },
    /// `JOIN <port>`: ask a peer's admission gate to accept the sender.
    Join { port: u16 },
}

/// Reply of an admission gate to a `JOIN` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinReply {
    Allow,
    Deny,
}

impl JoinReply {
    pub fn as_token(&self) -> &'static str {
        match self {
            JoinReply::Allow => ALLOW_TOKEN,
            JoinReply::Deny => DENY_TOKEN,
        }
    }
}

impl From<bool> for JoinReply {
    fn from(allowed: bool) -> Self {
        if allowed {
            JoinReply::Allow
        } else {
            JoinReply::Deny
        }
    }
}
