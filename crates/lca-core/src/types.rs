use serde::{Deserialize, Serialize};

/// Current `MasterConfig` format version
pub const MASTER_CONFIG_VERSION: u32 = 1;

/// One synced archive, as listed in the master descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub uuid: String,
    pub name: String,
}

/// Device-wide manifest of every archive taking part in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterConfig {
    pub version: u32,
    pub files: Vec<FileEntry>,
}

impl MasterConfig {
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self {
            version: MASTER_CONFIG_VERSION,
            files,
        }
    }
}

/// Per-archive sync metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub uuid: String,
    pub name: String,
}
