//! LYRA Connection Gateway
//!
//! The orchestrator of the gateway: owns the set of live connections,
//! binds each to its resolved identity and capability set, enforces the
//! command permission table, fans out backend change events through the
//! subscription registry, and throttles event floods.
//!
//! External collaborators (backend store, session store, password
//! verifier) are trait objects supplied by the embedding host; the host
//! drives the gateway with `connect`, `handle_command`, `publish`, and
//! `disconnect`, and tears it down with `close`.

pub mod backend;
pub mod config;
pub mod connection;
pub mod gateway;
pub mod threshold;

pub use backend::*;
pub use config::*;
pub use connection::*;
pub use gateway::*;
pub use threshold::*;
