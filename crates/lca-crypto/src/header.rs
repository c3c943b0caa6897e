//! Fixed 64-byte self-describing envelope header
//!
//! ```text
//! offset  size  field
//!      0    12  magic ("RATATOSKR_01")
//!     12    16  instance id (random UUID, raw bytes)
//!     28     1  cipher flag (1 = ChaCha20-Poly1305)
//!     29     4  Argon2id memory cost, KiB (u32 LE)
//!     33     4  Argon2id iterations (u32 LE)
//!     37     1  Argon2id parallelism (u8)
//!     38    26  reserved, zero on creation
//! ```
//!
//! Readers ignore the reserved region so later versions can use it without
//! breaking older decoders.

use lca_core::{LcaError, LcaResult};
use uuid::Uuid;

use crate::cipher::CipherSuite;
use crate::kdf::KdfParams;

/// Total header length in bytes
pub const HEADER_SIZE: usize = 64;

/// Format and version tag
pub const MAGIC: &[u8; 12] = b"RATATOSKR_01";

const MAGIC_OFFSET: usize = 0;
const ID_OFFSET: usize = 12;
const CIPHER_OFFSET: usize = 28;
const MEM_COST_OFFSET: usize = 29;
const ITERATIONS_OFFSET: usize = 33;
const PARALLELISM_OFFSET: usize = 37;
const RESERVED_OFFSET: usize = 38;

/// An envelope header. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    raw: [u8; HEADER_SIZE],
}

impl Header {
    /// Build a fresh header recording the KDF parameters used for this envelope.
    pub fn create(params: KdfParams) -> Self {
        let mut raw = [0u8; HEADER_SIZE];
        raw[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC.len()].copy_from_slice(MAGIC);
        raw[ID_OFFSET..CIPHER_OFFSET].copy_from_slice(Uuid::new_v4().as_bytes());
        raw[CIPHER_OFFSET] = CipherSuite::ChaCha20Poly1305.flag();
        raw[MEM_COST_OFFSET..ITERATIONS_OFFSET].copy_from_slice(&params.mem_cost_kib.to_le_bytes());
        raw[ITERATIONS_OFFSET..PARALLELISM_OFFSET].copy_from_slice(&params.iterations.to_le_bytes());
        raw[PARALLELISM_OFFSET] = params.parallelism;
        Self { raw }
    }

    /// Parse exactly [`HEADER_SIZE`] bytes. Fails on a length or magic
    /// mismatch; reserved bytes are not inspected.
    pub fn parse(bytes: &[u8]) -> LcaResult<Self> {
        let raw: [u8; HEADER_SIZE] = bytes.try_into().map_err(|_| {
            LcaError::Format(format!(
                "invalid header size: expected {HEADER_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        let header = Self { raw };
        if !header.is_valid() {
            return Err(LcaError::format("invalid or corrupt header: magic mismatch"));
        }
        Ok(header)
    }

    /// Non-failing variant of [`Header::parse`] for layout detection.
    pub fn try_parse(bytes: &[u8]) -> Option<Self> {
        Self::parse(bytes).ok()
    }

    pub fn is_valid(&self) -> bool {
        &self.raw[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC.len()] == MAGIC
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw
    }

    pub fn magic(&self) -> &[u8] {
        &self.raw[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC.len()]
    }

    pub fn instance_id(&self) -> Uuid {
        let mut id = [0u8; 16];
        id.copy_from_slice(&self.raw[ID_OFFSET..CIPHER_OFFSET]);
        Uuid::from_bytes(id)
    }

    pub fn cipher_flag(&self) -> u8 {
        self.raw[CIPHER_OFFSET]
    }

    /// The cipher named by the flag byte, if this build knows it.
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        CipherSuite::from_flag(self.cipher_flag())
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            mem_cost_kib: read_u32_le(&self.raw, MEM_COST_OFFSET),
            iterations: read_u32_le(&self.raw, ITERATIONS_OFFSET),
            parallelism: self.raw[PARALLELISM_OFFSET],
        }
    }

    pub fn reserved(&self) -> &[u8] {
        &self.raw[RESERVED_OFFSET..]
    }
}

fn read_u32_le(raw: &[u8; HEADER_SIZE], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("instance_id", &self.instance_id())
            .field("cipher_flag", &self.cipher_flag())
            .field("kdf", &self.kdf_params())
            .finish()
    }
}
