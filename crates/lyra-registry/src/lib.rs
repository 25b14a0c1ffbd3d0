//! LYRA Subscription Registry
//!
//! This crate implements the refcounted pattern-subscription table:
//! - Per-connection subscription lists for each event stream
//! - Global refcounts driving upstream subscribe/unsubscribe exactly once
//!   per distinct pattern
//! - Publish matching (first match per connection per event)
//! - Degraded-mode coarsening of the upstream state subscription set

pub mod registry;

pub use registry::*;
