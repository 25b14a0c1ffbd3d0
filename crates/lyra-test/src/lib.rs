//! LYRA Test Harness - Gateway validation
//!
//! This crate provides:
//! - In-memory doubles for the backend, session store, and verifier
//! - A one-call harness that assembles a full gateway around them
//! - End-to-end integration tests for the gateway behavior

pub mod doubles;
pub mod integration;

pub use doubles::*;
pub use integration::*;
