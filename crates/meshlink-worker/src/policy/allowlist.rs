//! Sender allow-list.

use std::collections::HashSet;

/// Compiled `allow_from` list. Empty means allow-all.
#[derive(Debug, Clone, Default)]
pub struct SenderAllowList {
    ids: HashSet<String>,
}

impl SenderAllowList {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = raw
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { ids }
    }

    pub fn allows_all(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_allowed(&self, sender_id: &str) -> bool {
        self.allows_all() || self.ids.contains(sender_id)
    }
}
