//! Inbound dispatch.
//!
//! Routes decoded hub frames by type: heartbeats and acks are logged, routed
//! messages go to the bus after the sender policy check, and unsolicited
//! `auth_ok` frames are surfaced to the caller as identity updates.

pub mod dispatcher;

pub use dispatcher::{Dispatched, Dispatcher};
