use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LcaConfig {
    pub kdf: KdfConfig,
    pub log: LogConfig,
}

/// Argon2id cost parameters written into new envelopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub iterations: u32,
    /// Argon2id lanes (default: 1)
    pub parallelism: u8,
    /// Largest memory cost accepted from an envelope header, in KiB
    /// (default: 1048576 = 1 GiB)
    pub max_mem_cost_kib: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            iterations: 3,
            parallelism: 1,
            max_mem_cost_kib: 1 << 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}
