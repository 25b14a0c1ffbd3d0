//! LYRA Session Manager
//!
//! This crate resolves a connection's identity and keeps its backing
//! session alive:
//! - Signed session cookies (express-compatible `connect.sid`)
//! - Identity resolution: explicit credentials first, then cookie lookup
//! - Rate-limited session renewal against the external session store

pub mod cookie;
pub mod manager;
pub mod store;

pub use cookie::*;
pub use manager::*;
pub use store::*;
