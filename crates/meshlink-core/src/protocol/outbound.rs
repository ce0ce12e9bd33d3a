//! Worker -> hub frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::identity::Identity;

/// Outbound frame catalogue. Serialized with `type` as the tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth(AuthRequest),
    Ping,
    Message(RoutedSend),
}

/// `auth` frame.
///
/// `identity` is present only when reconnecting with a known identity; its
/// absence asks the hub for a first-time registration.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub role: String,
    pub name: String,
    pub tags: Vec<String>,
    pub meta: AuthMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthMeta {
    pub client: String,
    /// Unix milliseconds.
    pub timestamp: u64,
}

/// `message` frame.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedSend {
    pub to: Target,
    pub payload: Value,
    pub msg_id: String,
}

/// Routing target of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Target {
    /// Single id, or a broadcast marker (`*`, `all`).
    One(String),
    /// Explicit recipient list.
    Many(Vec<String>),
}

/// Broadcast marker used when no target is given.
pub const BROADCAST: &str = "*";

/// Resolve a chat id into a routing target.
///
/// - empty -> `"*"`
/// - `"*"` or any casing of `"all"` -> passed through unchanged
/// - comma list -> split, trimmed, empties dropped; one survivor collapses
///   to a single id, none falls back to the trimmed input
/// - anything else -> the trimmed input
pub fn resolve_target(chat_id: &str) -> Target {
    let chat_id = chat_id.trim();
    if chat_id.is_empty() {
        return Target::One(BROADCAST.to_string());
    }
    if chat_id == BROADCAST || chat_id.eq_ignore_ascii_case("all") {
        return Target::One(chat_id.to_string());
    }

    if chat_id.contains(',') {
        let mut ids: Vec<String> = chat_id
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        match ids.len() {
            0 => {}
            1 => return Target::One(ids.remove(0)),
            _ => return Target::Many(ids),
        }
    }

    Target::One(chat_id.to_string())
}

/// Build a routed payload from caller content.
///
/// Content that parses as JSON is sent structurally; anything else is
/// wrapped as `{"content": ...}`.
pub fn build_payload(content: &str) -> Value {
    let content = content.trim();
    if content.is_empty() {
        return json!({ "content": "" });
    }
    match serde_json::from_str::<Value>(content) {
        Ok(parsed) => parsed,
        Err(_) => json!({ "content": content }),
    }
}

/// Time-based message id generator, strictly increasing per instance.
#[derive(Debug)]
pub struct MsgIdGen {
    prefix: &'static str,
    last: AtomicU64,
}

impl MsgIdGen {
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            last: AtomicU64::new(0),
        }
    }

    /// Next id: `<prefix>-<unix nanos>`, bumped past the previous id when the
    /// clock has not advanced.
    pub fn next_id(&self) -> String {
        let now = unix_nanos();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return format!("{}-{}", self.prefix, candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Unix time in milliseconds (0 if the clock is before the epoch).
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
