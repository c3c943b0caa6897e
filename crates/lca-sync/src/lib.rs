//! lca-sync: encryption of small sync descriptors
//!
//! Payload format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! No header, no salt, no container: the master key is established out of
//! band for the whole sync session and injected with
//! [`SyncService::set_master_key`]. Every descriptor is sealed independently
//! under its own nonce.

pub mod service;

pub use lca_core::types::{FileConfig, FileEntry, MasterConfig};
pub use service::SyncService;
