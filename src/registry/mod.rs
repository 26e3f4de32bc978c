//! Bootstrap Registry Module
//!
//! The single rendezvous point of the network. Peers announce their listening port
//! with `REGISTER <port>` and receive the ports of everyone registered before or
//! alongside them.
//!
//! ## Guarantees
//! - **Idempotent**: re-registering a port never duplicates it.
//! - **Self-exclusion**: a peer never receives its own port.
//! - **Atomic snapshots**: insertion and the returned list come from one critical section.
//!
//! There is no deregistration and no liveness tracking. The registry is not replicated.

pub mod client;
pub mod service;
pub mod types;

pub use client::discover_peers;
pub use service::{BootstrapRegistry, RegistryService};
