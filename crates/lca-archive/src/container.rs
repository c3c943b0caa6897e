//! Zip container holding the single protected entry

use std::io::{Cursor, Read, Write};

use lca_core::{LcaError, LcaResult};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the entry carrying `salt || nonce || ciphertext`
pub const ENTRY_NAME: &str = "timi.db";

/// Build a new zip archive with `payload` stored under `entry_name`.
pub fn pack(entry_name: &str, payload: &[u8]) -> LcaResult<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(payload.len() as u64 >= u64::from(u32::MAX));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(entry_name, options)
        .map_err(|e| LcaError::Other(anyhow::anyhow!("starting container entry: {e}")))?;
    writer.write_all(payload)?;
    let cursor = writer
        .finish()
        .map_err(|e| LcaError::Other(anyhow::anyhow!("finishing container: {e}")))?;

    Ok(cursor.into_inner())
}

/// Open a zip archive and read the entry named `entry_name`.
pub fn unpack(container: &[u8], entry_name: &str) -> LcaResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(container))
        .map_err(|e| LcaError::Format(format!("not a valid container: {e}")))?;

    let mut entry = archive.by_name(entry_name).map_err(|e| match e {
        ZipError::FileNotFound => {
            LcaError::Format(format!("invalid archive: {entry_name} not found"))
        }
        other => LcaError::Format(format!("reading container entry {entry_name}: {other}")),
    })?;

    let mut payload = Vec::new();
    entry
        .read_to_end(&mut payload)
        .map_err(|e| LcaError::Format(format!("corrupt container entry {entry_name}: {e}")))?;
    Ok(payload)
}
