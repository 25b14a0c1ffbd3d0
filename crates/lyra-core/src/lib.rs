//! LYRA Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the LYRA gateway:
//! - Identifiers (ConnectionId)
//! - Subscription patterns and their compiled matchers
//! - The closed command vocabulary and its static permission table
//! - Capability sets (ACLs)
//! - Error taxonomy

pub mod acl;
pub mod command;
pub mod error;
pub mod id;
pub mod pattern;

pub use acl::*;
pub use command::*;
pub use error::*;
pub use id::*;
pub use pattern::*;
