//! Process-wide crypto initialization
//!
//! [`CryptoContext::init`] runs once at startup. The returned `Arc` is handed
//! to every service that seals or opens data; nothing initializes lazily.

use std::sync::Arc;

use lca_core::config::KdfConfig;
use lca_core::{LcaError, LcaResult};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};

use crate::cipher;
use crate::kdf::{KdfParams, MasterKey};
use crate::KEY_SIZE;

/// Readiness handle shared by all envelope and sync services.
#[derive(Debug)]
pub struct CryptoContext {
    archive_params: KdfParams,
    max_mem_cost_kib: u32,
}

impl CryptoContext {
    /// Validate the configured KDF parameters, probe the OS RNG, and check
    /// that the AEAD round-trips a fixed vector.
    pub fn init(config: &KdfConfig) -> LcaResult<Arc<Self>> {
        let archive_params = KdfParams::from(config);
        archive_params
            .to_argon2()
            .map_err(|e| LcaError::Config(format!("kdf: {e}")))?;

        if archive_params.mem_cost_kib > config.max_mem_cost_kib {
            return Err(LcaError::Config(format!(
                "kdf: mem_cost_kib {} exceeds max_mem_cost_kib {}",
                archive_params.mem_cost_kib, config.max_mem_cost_kib
            )));
        }

        let mut probe = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|e| LcaError::Other(anyhow::anyhow!("OS RNG unavailable: {e}")))?;

        self_check()?;

        info!(
            kdf = %archive_params,
            max_mem_cost_kib = config.max_mem_cost_kib,
            "crypto context initialized"
        );

        Ok(Arc::new(Self {
            archive_params,
            max_mem_cost_kib: config.max_mem_cost_kib,
        }))
    }

    /// KDF parameters written into new envelopes
    pub fn archive_params(&self) -> KdfParams {
        self.archive_params
    }

    /// KDF parameters assumed for header-less envelopes
    pub fn legacy_params(&self) -> KdfParams {
        KdfParams::LEGACY
    }

    pub fn max_mem_cost_kib(&self) -> u32 {
        self.max_mem_cost_kib
    }

    /// Check parameters read from an untrusted header before deriving with them.
    pub fn check_untrusted_params(&self, params: &KdfParams) -> LcaResult<()> {
        if params.mem_cost_kib > self.max_mem_cost_kib {
            return Err(LcaError::Format(format!(
                "header memory cost {} KiB exceeds limit of {} KiB",
                params.mem_cost_kib, self.max_mem_cost_kib
            )));
        }
        params
            .to_argon2()
            .map_err(|e| LcaError::Format(format!("header carries unusable KDF parameters: {e}")))?;
        Ok(())
    }
}

fn self_check() -> LcaResult<()> {
    let key = MasterKey::from_bytes([0x5A; KEY_SIZE]);
    let probe = b"lca self-check";
    let sealed = cipher::encrypt(probe, &key)?;
    let opened = cipher::decrypt(&sealed.ciphertext, &sealed.nonce, &key)?;
    if opened != probe {
        return Err(LcaError::Other(anyhow::anyhow!("AEAD self-check mismatch")));
    }
    debug!("AEAD self-check passed");
    Ok(())
}
