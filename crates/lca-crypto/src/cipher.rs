//! ChaCha20-Poly1305 (IETF) encryption/decryption
//!
//! Sealed format:
//! ```text
//! nonce:      [12 bytes: random]
//! ciphertext: [N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! The associated-data field is always empty. It is kept reserved so a later
//! format can bind header bytes without changing the primitive.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use lca_core::{LcaError, LcaResult};
use rand::RngCore;

use crate::kdf::MasterKey;
use crate::{NONCE_SIZE, TAG_SIZE};

const ASSOCIATED_DATA: &[u8] = &[];

/// AEAD algorithm recorded in the header's cipher flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CipherSuite {
    ChaCha20Poly1305 = 1,
}

impl CipherSuite {
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            1 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }

    pub fn flag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

/// Output of [`encrypt`]: the fresh nonce and `ciphertext || tag`
#[derive(Debug, Clone)]
pub struct Sealed {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// `nonce || ciphertext || tag`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split `nonce || ciphertext || tag`. Anything shorter than a nonce plus
    /// a tag cannot have been produced by [`encrypt`].
    pub fn from_bytes(data: &[u8]) -> LcaResult<Self> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(LcaError::Format(format!(
                "sealed payload too short: {} bytes (minimum {})",
                data.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> LcaResult<Sealed> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: ASSOCIATED_DATA,
            },
        )
        .map_err(|e| LcaError::Other(anyhow::anyhow!("encryption failed: {e}")))?;

    Ok(Sealed { nonce, ciphertext })
}

/// Decrypt `ciphertext || tag` under `key`.
///
/// A tag mismatch is reported as [`LcaError::Authentication`] whether the key
/// or the data is wrong.
pub fn decrypt(ciphertext: &[u8], nonce: &[u8; NONCE_SIZE], key: &MasterKey) -> LcaResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(LcaError::Authentication);
    }

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: ASSOCIATED_DATA,
            },
        )
        .map_err(|_| LcaError::Authentication)
}
