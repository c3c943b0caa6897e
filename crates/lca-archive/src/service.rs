//! ArchiveService: seal a snapshot into a `.lca` envelope and open it again

use std::sync::Arc;

use lca_core::{LcaError, LcaResult};
use lca_crypto::{cipher, derive_key, generate_salt, CryptoContext, Header};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::container::{self, ENTRY_NAME};
use crate::envelope::{self, EnvelopeLayout, ProtectedBlob};
use crate::snapshot::Snapshot;

/// Seals and opens envelopes. Holds no state beyond the shared crypto context,
/// so one instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    ctx: Arc<CryptoContext>,
}

impl ArchiveService {
    pub fn new(ctx: Arc<CryptoContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<CryptoContext> {
        &self.ctx
    }

    /// Encrypt `data` under `passphrase` and return a complete envelope.
    ///
    /// Key derivation runs on the blocking pool; the returned future only
    /// awaits it.
    pub async fn encrypt_and_archive(
        &self,
        data: &[u8],
        passphrase: &SecretString,
    ) -> LcaResult<Vec<u8>> {
        let ctx = Arc::clone(&self.ctx);
        let data = data.to_vec();
        let passphrase = SecretString::from(passphrase.expose_secret());
        run_blocking(move || seal_envelope(&ctx, &data, &passphrase)).await
    }

    /// Decrypt an envelope (with or without a header) back to the original bytes.
    pub async fn decrypt_and_open(
        &self,
        envelope: &[u8],
        passphrase: &SecretString,
    ) -> LcaResult<Vec<u8>> {
        let ctx = Arc::clone(&self.ctx);
        let envelope = envelope.to_vec();
        let passphrase = SecretString::from(passphrase.expose_secret());
        run_blocking(move || open_envelope(&ctx, &envelope, &passphrase)).await
    }

    /// Export `source` and seal the exported bytes.
    pub async fn archive_snapshot<S: Snapshot + ?Sized>(
        &self,
        source: &S,
        passphrase: &SecretString,
    ) -> LcaResult<Vec<u8>> {
        let data = source.export()?;
        self.encrypt_and_archive(&data, passphrase).await
    }

    /// Open `envelope` and hand the plaintext to `target`. `target` is only
    /// touched once decryption has fully succeeded.
    pub async fn restore_snapshot<S: Snapshot + ?Sized>(
        &self,
        target: &mut S,
        envelope: &[u8],
        passphrase: &SecretString,
    ) -> LcaResult<()> {
        let data = self.decrypt_and_open(envelope, passphrase).await?;
        target.load(&data)
    }
}

async fn run_blocking<T, F>(f: F) -> LcaResult<T>
where
    F: FnOnce() -> LcaResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LcaError::Other(anyhow::anyhow!("envelope task failed: {e}")))?
}

/// Synchronous sealing path behind [`ArchiveService::encrypt_and_archive`].
pub fn seal_envelope(
    ctx: &CryptoContext,
    data: &[u8],
    passphrase: &SecretString,
) -> LcaResult<Vec<u8>> {
    let params = ctx.archive_params();
    let salt = generate_salt();
    let key = derive_key(passphrase, &salt, &params)?;

    let sealed = cipher::encrypt(data, &key)?;
    drop(key);

    let blob = ProtectedBlob { salt, sealed };
    let container = container::pack(ENTRY_NAME, &blob.to_bytes())?;
    let header = Header::create(params);

    info!(
        instance_id = %header.instance_id(),
        kdf = %params,
        plaintext_bytes = data.len(),
        container_bytes = container.len(),
        "sealed envelope"
    );

    Ok(envelope::assemble(&header, &container))
}

/// Synchronous opening path behind [`ArchiveService::decrypt_and_open`].
pub fn open_envelope(
    ctx: &CryptoContext,
    envelope: &[u8],
    passphrase: &SecretString,
) -> LcaResult<Vec<u8>> {
    let layout = EnvelopeLayout::detect(envelope);
    match layout.header() {
        Some(header) => debug!(
            instance_id = %header.instance_id(),
            envelope_bytes = envelope.len(),
            "envelope has header"
        ),
        None => warn!(
            envelope_bytes = envelope.len(),
            "no envelope header; treating input as legacy container"
        ),
    }

    let params = layout.kdf_params(ctx)?;
    let entry = container::unpack(layout.container(), ENTRY_NAME)?;
    let blob = ProtectedBlob::from_bytes(&entry)?;

    let key = derive_key(passphrase, &blob.salt, &params)?;
    let plaintext = cipher::decrypt(&blob.sealed.ciphertext, &blob.sealed.nonce, &key)?;

    debug!(kdf = %params, plaintext_bytes = plaintext.len(), "opened envelope");
    Ok(plaintext)
}
