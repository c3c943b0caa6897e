//! Key derivation: Argon2id passphrase → 256-bit key

use argon2::{Algorithm, Argon2, Params, Version};
use lca_core::config::KdfConfig;
use lca_core::{LcaError, LcaResult};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit key derived from a passphrase via Argon2id, or injected by a
/// caller that established it elsewhere.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from an arbitrary slice, rejecting anything that is not
    /// exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> LcaResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            LcaError::Precondition(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id cost parameters, as recorded in an envelope header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub mem_cost_kib: u32,
    /// Time cost (passes over memory)
    pub iterations: u32,
    /// Lane count
    pub parallelism: u8,
}

impl KdfParams {
    /// Parameters written into new envelopes: 64 MiB, 3 passes, 1 lane.
    pub const DEFAULT: Self = Self {
        mem_cost_kib: 65536,
        iterations: 3,
        parallelism: 1,
    };

    /// Parameters for header-less envelopes. These match the interactive
    /// limits (64 MiB, 2 passes, 1 lane) the pre-header writer hardcoded.
    pub const LEGACY: Self = Self {
        mem_cost_kib: 65536,
        iterations: 2,
        parallelism: 1,
    };

    pub const fn new(mem_cost_kib: u32, iterations: u32, parallelism: u8) -> Self {
        Self {
            mem_cost_kib,
            iterations,
            parallelism,
        }
    }

    /// Validate against Argon2's own bounds and build its parameter block.
    pub fn to_argon2(&self) -> LcaResult<Params> {
        Params::new(
            self.mem_cost_kib,
            self.iterations,
            u32::from(self.parallelism),
            Some(KEY_SIZE),
        )
        .map_err(|e| LcaError::Kdf(format!("invalid Argon2id params {self}: {e}")))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&KdfConfig> for KdfParams {
    fn from(config: &KdfConfig) -> Self {
        Self::new(config.mem_cost_kib, config.iterations, config.parallelism)
    }
}

impl std::fmt::Display for KdfParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "m={}KiB t={} p={}",
            self.mem_cost_kib, self.iterations, self.parallelism
        )
    }
}

/// Generate a fresh random salt. Never reuse one across envelopes.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from a passphrase and salt using Argon2id v1.3.
///
/// Deterministic: identical inputs always produce the identical key. The salt
/// is stored next to the ciphertext (it does not need to be secret).
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> LcaResult<MasterKey> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| LcaError::Kdf(format!("Argon2id KDF failed: {e}")))?;

    Ok(MasterKey::from_bytes(key))
}
