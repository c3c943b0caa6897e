//! lca-crypto: primitives behind the `.lca` envelope
//!
//! Envelope layout:
//! ```text
//! [64 bytes: header (optional)][container]
//!   header    = magic || instance id || cipher flag || Argon2id params || reserved
//!   container = zip with one entry: salt (16) || nonce (12) || ciphertext || tag (16)
//! ```
//!
//! Key derivation is Argon2id (passphrase + per-envelope salt). Encryption is
//! ChaCha20-Poly1305 in its IETF form with an empty associated-data field.
//! Everything here is synchronous; callers that sit on an async runtime move
//! the KDF onto a blocking thread.

pub mod cipher;
pub mod context;
pub mod header;
pub mod kdf;

pub use cipher::{decrypt, encrypt, CipherSuite, Sealed};
pub use context::CryptoContext;
pub use header::{Header, HEADER_SIZE, MAGIC};
pub use kdf::{derive_key, generate_salt, KdfParams, MasterKey};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a ChaCha20-Poly1305 (IETF) nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of an Argon2id salt
pub const SALT_SIZE: usize = 16;
