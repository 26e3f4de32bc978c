//! Wire Protocol Module
//!
//! Plain-text request/response protocol spoken between peers and the bootstrap registry.
//!
//! ## Message Shapes
//! - **`REGISTER <port>`**: Sent to the registry. Answered with a comma-separated list of
//!   the other registered ports (possibly empty).
//! - **`JOIN <port>`**: Sent to a peer's admission gate. Answered with `ALLOW` or `DENY`.
//!
//! Every connection carries exactly one exchange. The requester writes its message and
//! half-closes; the responder takes the request from one bounded read (it never waits
//! for the half-close), replies, and closes. Messages are bounded by
//! [`MAX_MESSAGE_BYTES`] and are never reassembled across connections.

pub mod codec;
pub mod transport;
pub mod types;

pub use types::{JoinReply, ProtocolError, Request};

/// Largest accepted payload for a single message, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 1024;

#[cfg(test)]
mod tests;
