use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use meshlink_core::error::{MeshError, Result};

/// Shortest reconnect / ping cadence accepted.
pub const MIN_INTERVAL_SECS: u64 = 5;
/// Ping cadence when none is configured.
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    pub version: u32,

    #[serde(default)]
    pub worker_ws: WorkerWsConfig,
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MeshError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.worker_ws.validate()
    }
}

/// Mesh node role announced in `auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Employee,
    Boss,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Boss => "boss",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `worker_ws` section. Every field defaults so that `validate` can name
/// the missing one instead of failing inside the YAML parser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerWsConfig {
    /// Hub WebSocket URL (`ws://host:port/path`).
    #[serde(default)]
    pub address: String,

    /// `employee` or `boss`.
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Shared hub key, sent only when non-blank.
    #[serde(default)]
    pub authkey: String,

    /// Identity file; blank means the default under the home directory.
    #[serde(default)]
    pub identity_file: String,

    /// Seconds between reconnect attempts. 0 disables reconnection.
    #[serde(default)]
    pub reconnect_interval: u64,

    /// Seconds between pings. 0 means the default.
    #[serde(default)]
    pub ping_interval: u64,

    /// Sender ids accepted for inbound messages. Empty allows everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,
}

impl WorkerWsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(MeshError::Config("worker_ws.address is required".into()));
        }
        self.role()?;
        if self.name.trim().is_empty() {
            return Err(MeshError::Config("worker_ws.name is required".into()));
        }
        if self.clean_tags().is_empty() {
            return Err(MeshError::Config(
                "worker_ws.tags requires at least one non-empty tag".into(),
            ));
        }
        Ok(())
    }

    pub fn role(&self) -> Result<Role> {
        match self.role.as_str() {
            "employee" => Ok(Role::Employee),
            "boss" => Ok(Role::Boss),
            r if r.trim().is_empty() => Err(MeshError::Config("worker_ws.role is required".into())),
            _ => Err(MeshError::Config(
                "worker_ws.role must be boss or employee".into(),
            )),
        }
    }

    /// Trimmed, non-empty tags. Order, case, and duplicates are kept.
    pub fn clean_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `None` when reconnection is disabled.
    pub fn reconnect_interval(&self) -> Option<Duration> {
        match self.reconnect_interval {
            0 => None,
            s => Some(Duration::from_secs(s.max(MIN_INTERVAL_SECS))),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        let s = match self.ping_interval {
            0 => DEFAULT_PING_INTERVAL_SECS,
            s => s,
        };
        Duration::from_secs(s.max(MIN_INTERVAL_SECS))
    }

    /// Configured auth key, if non-blank.
    pub fn authkey(&self) -> Option<&str> {
        (!self.authkey.trim().is_empty()).then_some(self.authkey.as_str())
    }
}
