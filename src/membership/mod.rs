//! Membership & Admission Module
//!
//! Implements the per-node side of the network: admitting others and getting admitted.
//! A node learns candidate peers from the bootstrap registry and asks each one for
//! admission over TCP, while its own gate answers the same question for newcomers.
//!
//! ## Core Mechanisms
//! - **Admission Gate**: Answers inbound `JOIN` requests through an injected decision function.
//! - **Join Orchestrator**: Sequential outbound `JOIN`s with a conjunctive veto: any explicit
//!   `DENY` rejects the whole join, unreachable peers are skipped.
//! - **Membership Set**: Local, monotonically growing view of the network. Not reconciled
//!   with other nodes' views.

pub mod decision;
pub mod gate;
pub mod orchestrator;
pub mod service;
pub mod status;
pub mod types;
