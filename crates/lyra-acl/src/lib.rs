//! LYRA ACL Engine - capability resolution
//!
//! This crate computes a connection's effective capability set:
//! - Address whitelist with exact, wildcard, and default entries
//! - Narrowing merge of role-based grants with whitelist overrides
//!
//! The merge can only remove permissions, never add them. The one
//! exception is the explicit identity substitution a whitelist entry may
//! carry.

pub mod merge;
pub mod whitelist;

pub use merge::*;
pub use whitelist::*;
