//! Inbound sender policy.
//!
//! Compiles `allow_from` into a lookup set consulted by the dispatcher before
//! any routed message reaches the bus.

pub mod allowlist;

pub use allowlist::SenderAllowList;
