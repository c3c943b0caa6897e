//! Storage collaborator: something that can export its state as bytes and be
//! rehydrated from them.

use std::path::{Path, PathBuf};

use lca_core::LcaResult;
use tracing::debug;

pub trait Snapshot {
    /// Serialize the current state.
    fn export(&self) -> LcaResult<Vec<u8>>;

    /// Replace the current state with `bytes`.
    fn load(&mut self, bytes: &[u8]) -> LcaResult<()>;
}

/// A database snapshot kept as a single file on disk.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Snapshot for FileSnapshot {
    fn export(&self) -> LcaResult<Vec<u8>> {
        let bytes = std::fs::read(&self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "exported snapshot");
        Ok(bytes)
    }

    /// Writes to a sibling temp file, then renames it over the target.
    fn load(&mut self, bytes: &[u8]) -> LcaResult<()> {
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".lca-tmp");
        let tmp = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), bytes = bytes.len(), "loaded snapshot");
        Ok(())
    }
}
