//! meshlink core: transport-agnostic wire contracts and the shared error type.
//!
//! This crate defines the JSON message catalogue spoken between a worker and
//! its supervisor hub, plus the error surface shared by the worker runtime.
//! It carries no transport or async runtime dependencies, so the same frame
//! types can back the client, test hubs, and tooling.
//!
//! # Panics
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed peer traffic surfaces as `MeshError` instead of crashing the
//! worker process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{MeshError, Result};
