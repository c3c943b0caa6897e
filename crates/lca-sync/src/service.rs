use std::sync::Arc;

use lca_core::types::{FileConfig, FileEntry, MasterConfig};
use lca_core::{LcaError, LcaResult};
use lca_crypto::{cipher, CryptoContext, MasterKey, Sealed};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Seals sync descriptors under a caller-supplied master key.
///
/// [`SyncService::set_master_key`] takes `&mut self`: once the service is
/// shared, the key is read-only.
#[derive(Debug)]
pub struct SyncService {
    ctx: Arc<CryptoContext>,
    master_key: Option<MasterKey>,
}

impl SyncService {
    pub fn new(ctx: Arc<CryptoContext>) -> Self {
        Self {
            ctx,
            master_key: None,
        }
    }

    pub fn context(&self) -> &Arc<CryptoContext> {
        &self.ctx
    }

    /// Install the session key. Must be called before any other operation.
    pub fn set_master_key(&mut self, key: MasterKey) {
        self.master_key = Some(key);
        debug!("sync master key installed");
    }

    pub fn has_master_key(&self) -> bool {
        self.master_key.is_some()
    }

    fn key(&self) -> LcaResult<&MasterKey> {
        self.master_key.as_ref().ok_or_else(|| {
            LcaError::Precondition("master key not set; cannot process sync payload".into())
        })
    }

    /// Seal `payload` as `nonce || ciphertext || tag`.
    pub fn encrypt(&self, payload: &[u8]) -> LcaResult<Vec<u8>> {
        let key = self.key()?;
        let sealed = cipher::encrypt(payload, key)?;
        Ok(sealed.to_bytes())
    }

    /// Open a sealed payload and return it as UTF-8 text.
    pub fn decrypt(&self, encrypted: &[u8]) -> LcaResult<String> {
        let plaintext = self.decrypt_bytes(encrypted)?;
        String::from_utf8(plaintext)
            .map_err(|e| LcaError::Format(format!("sync payload is not UTF-8: {e}")))
    }

    pub fn decrypt_bytes(&self, encrypted: &[u8]) -> LcaResult<Vec<u8>> {
        let key = self.key()?;
        let sealed = Sealed::from_bytes(encrypted)?;
        cipher::decrypt(&sealed.ciphertext, &sealed.nonce, key)
    }

    /// Build and seal the device-wide manifest listing every synced archive.
    pub fn create_encrypted_master_config(&self, files: &[FileEntry]) -> LcaResult<Vec<u8>> {
        self.key()?;
        let config = MasterConfig::new(files.to_vec());
        debug!(files = config.files.len(), "sealing master config");
        self.seal_json(&config)
    }

    /// Build and seal the sync metadata for one archive.
    pub fn create_encrypted_file_config(&self, uuid: &str, name: &str) -> LcaResult<Vec<u8>> {
        self.key()?;
        let config = FileConfig {
            uuid: uuid.to_string(),
            name: name.to_string(),
        };
        self.seal_json(&config)
    }

    pub fn open_master_config(&self, encrypted: &[u8]) -> LcaResult<MasterConfig> {
        self.open_json(encrypted)
    }

    pub fn open_file_config(&self, encrypted: &[u8]) -> LcaResult<FileConfig> {
        self.open_json(encrypted)
    }

    fn seal_json<T: Serialize>(&self, value: &T) -> LcaResult<Vec<u8>> {
        let json = serde_json::to_vec(value)
            .map_err(|e| LcaError::Other(anyhow::anyhow!("descriptor serialization: {e}")))?;
        self.encrypt(&json)
    }

    fn open_json<T: DeserializeOwned>(&self, encrypted: &[u8]) -> LcaResult<T> {
        let plaintext = self.decrypt_bytes(encrypted)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| LcaError::Format(format!("descriptor deserialization: {e}")))
    }
}
