//! Peer Admission Network Library
//!
//! This library crate defines the modules behind the `registry` and `peer` commands
//! of the binary (`main.rs`).
//!
//! ## Architecture Modules
//! - **`protocol`**: The plain-text wire codec (`REGISTER`, `JOIN`, peer lists,
//!   `ALLOW`/`DENY`) and the bounded one-exchange-per-connection transport.
//! - **`registry`**: The bootstrap registry. A lock-guarded table of peer ports that
//!   answers each registration with everyone else it knows.
//! - **`membership`**: Per-node admission. The inbound admission gate, the outbound
//!   join orchestrator, and the local membership set they both feed.
//! - **`listener`**: The TCP accept loop shared by the registry and every peer, one
//!   task per connection.
//!
//! Membership views are local and never reconciled: this is not a consensus protocol.

pub mod config;
pub mod error;
pub mod listener;
pub mod membership;
pub mod protocol;
pub mod registry;
