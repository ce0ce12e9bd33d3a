//! Persisted mesh identity.
//!
//! The `{id, key}` pair issued by the hub is written to a small JSON file so
//! a restarted worker reconnects as the same mesh node. Persistence is
//! best-effort: callers log failures and keep running.

mod path;
mod store;

pub use path::{expand_home, resolve_identity_path, DEFAULT_IDENTITY_FILE};
pub use store::IdentityStore;
