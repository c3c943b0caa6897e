//! lca-archive: passphrase-protected `.lca` envelopes
//!
//! Pipeline (seal): snapshot bytes → Argon2id(passphrase, fresh salt) →
//! ChaCha20-Poly1305 → `salt || nonce || ciphertext` as the single zip entry →
//! fresh header prepended. Opening reverses it, reading the KDF parameters
//! back from the header, or falling back to the legacy set when the file has
//! no header.

pub mod container;
pub mod envelope;
pub mod service;
pub mod snapshot;

pub use container::ENTRY_NAME;
pub use envelope::{EnvelopeLayout, ProtectedBlob};
pub use service::{open_envelope, seal_envelope, ArchiveService};
pub use snapshot::{FileSnapshot, Snapshot};
