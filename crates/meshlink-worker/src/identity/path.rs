use std::path::{Path, PathBuf};

/// Identity file used when none is configured.
pub const DEFAULT_IDENTITY_FILE: &str = "~/.meshlink/worker_ws_identity.json";

/// Expand a leading `~` against `home`.
///
/// Only `~` and `~/...` (or `~\...`) are expanded; `~user` forms and
/// everything else pass through, as does any path when `home` is unknown.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Resolve the configured identity file (blank -> default) to a real path.
pub fn resolve_identity_path(configured: &str, home: Option<&Path>) -> PathBuf {
    let configured = configured.trim();
    let path = if configured.is_empty() {
        DEFAULT_IDENTITY_FILE
    } else {
        configured
    };
    expand_home(path, home)
}
