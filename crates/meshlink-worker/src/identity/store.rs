use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::Identity;

use super::path::resolve_identity_path;

/// JSON file holding one [`Identity`].
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for a configured path, expanded against the user's home.
    pub fn from_config(identity_file: &str) -> Self {
        let home = dirs::home_dir();
        Self::new(resolve_identity_path(identity_file, home.as_deref()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored identity.
    ///
    /// A missing file or a partial identity is `Ok(None)`; unreadable files
    /// and malformed JSON are `Persistence` errors.
    pub fn load(&self) -> Result<Option<Identity>> {
        let data = match fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MeshError::Persistence(format!(
                    "read {} failed: {e}",
                    self.path.display()
                )))
            }
        };

        let ident: Identity = serde_json::from_slice(&data).map_err(|e| {
            MeshError::Persistence(format!("parse {} failed: {e}", self.path.display()))
        })?;
        Ok(ident.is_complete().then_some(ident))
    }

    /// Persist `ident` with owner-only permissions. Partial identities are
    /// skipped.
    ///
    /// Each save writes its own uniquely named sibling temp file and renames
    /// it into place, so concurrent saves never share a temp file.
    pub fn save(&self, ident: &Identity) -> Result<()> {
        if !ident.is_complete() {
            return Ok(());
        }

        let data = serde_json::to_vec_pretty(ident)
            .map_err(|e| MeshError::Persistence(format!("encode identity failed: {e}")))?;

        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| {
                    MeshError::Persistence(format!("create {} failed: {e}", dir.display()))
                })?;
                dir
            }
            None => Path::new("."),
        };

        let write_err = |e: std::io::Error| {
            MeshError::Persistence(format!("write {} failed: {e}", self.path.display()))
        };

        // Created with mode 0600 on unix; removed on drop if not persisted.
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&data).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
