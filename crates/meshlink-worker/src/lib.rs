//! meshlink worker runtime.
//!
//! This crate wires the transport, handshake engine, session loops, inbound
//! dispatcher, and identity store into a single `WorkerChannel` that joins a
//! supervisor hub and survives network loss without losing its mesh identity.
//! It is consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bus;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod identity;
pub mod policy;
pub mod session;
pub mod transport;

pub use bus::{InboundDelivery, MessageBus, OutboundMessage};
pub use channel::{Channel, WorkerChannel};
pub use config::{Role, WorkerConfig, WorkerWsConfig};
