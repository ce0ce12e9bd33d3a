//! Mesh identity issued by the hub on first successful auth.

use serde::{Deserialize, Serialize};

/// `{id, key}` pair that lets a worker reclaim its mesh identity after a
/// reconnect or a process restart.
///
/// Only complete identities (both fields non-empty) are ever stored or sent;
/// callers hold `Option<Identity>` and use [`Identity::complete`] to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
}

impl Identity {
    /// Build an identity, or `None` if either half is empty.
    pub fn complete(id: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let ident = Self {
            id: id.into(),
            key: key.into(),
        };
        ident.is_complete().then_some(ident)
    }

    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.key.is_empty()
    }
}
