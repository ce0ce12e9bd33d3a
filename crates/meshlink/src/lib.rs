//! Top-level facade crate for meshlink.
//!
//! Re-exports the wire contracts and the worker runtime so users can depend on a single crate.

pub mod core {
    pub use meshlink_core::*;
}

pub mod worker {
    pub use meshlink_worker::*;
}
