//! Integration tests for sealing and opening `.lca` envelopes.
//!
//! Most tests use cheap Argon2id parameters through `KdfConfig`; the concrete
//! scenario and the legacy test run the real cost settings.

use std::sync::Arc;

use lca_archive::container::{self, ENTRY_NAME};
use lca_archive::{ArchiveService, EnvelopeLayout, ProtectedBlob, Snapshot};
use lca_core::config::KdfConfig;
use lca_core::{LcaError, LcaResult};
use lca_crypto::{cipher, derive_key, generate_salt, CryptoContext, Header, KdfParams, HEADER_SIZE};
use proptest::prelude::*;
use secrecy::SecretString;

fn fast_service() -> ArchiveService {
    let ctx = CryptoContext::init(&KdfConfig {
        mem_cost_kib: 1024,
        iterations: 1,
        parallelism: 1,
        ..KdfConfig::default()
    })
    .expect("crypto context");
    ArchiveService::new(ctx)
}

fn default_service() -> ArchiveService {
    ArchiveService::new(CryptoContext::init(&KdfConfig::default()).expect("crypto context"))
}

fn pass(s: &str) -> SecretString {
    SecretString::from(s)
}

/// In-memory stand-in for the relational store.
#[derive(Default)]
struct MemoryDb {
    image: Vec<u8>,
    loads: usize,
}

impl Snapshot for MemoryDb {
    fn export(&self) -> LcaResult<Vec<u8>> {
        Ok(self.image.clone())
    }

    fn load(&mut self, bytes: &[u8]) -> LcaResult<()> {
        self.image = bytes.to_vec();
        self.loads += 1;
        Ok(())
    }
}

#[tokio::test]
async fn hello_scenario_with_default_params() {
    let service = default_service();

    let envelope = service
        .encrypt_and_archive(b"hello", &pass("pw123"))
        .await
        .expect("seal");
    assert!(envelope.len() > HEADER_SIZE);

    let header = Header::parse(&envelope[..HEADER_SIZE]).unwrap();
    assert_eq!(header.kdf_params(), KdfParams::DEFAULT);
    assert_eq!(header.cipher_flag(), 1);

    let opened = service
        .decrypt_and_open(&envelope, &pass("pw123"))
        .await
        .expect("open");
    assert_eq!(opened, b"hello");

    let err = service
        .decrypt_and_open(&envelope, &pass("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, LcaError::Authentication));
}

#[tokio::test]
async fn roundtrip_preserves_bytes_exactly() {
    let service = fast_service();
    let original: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    let envelope = service
        .encrypt_and_archive(&original, &pass("strong-password-for-testing"))
        .await
        .unwrap();
    let opened = service
        .decrypt_and_open(&envelope, &pass("strong-password-for-testing"))
        .await
        .unwrap();

    assert_eq!(opened, original);
}

#[tokio::test]
async fn roundtrip_empty_payload() {
    let service = fast_service();
    let envelope = service.encrypt_and_archive(b"", &pass("pw")).await.unwrap();
    assert!(service
        .decrypt_and_open(&envelope, &pass("pw"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn wrong_passphrase_is_authentication_error() {
    let service = fast_service();
    let envelope = service
        .encrypt_and_archive(b"calendar rows", &pass("correct"))
        .await
        .unwrap();

    let err = service
        .decrypt_and_open(&envelope, &pass("incorrect"))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn successive_envelopes_differ() {
    let service = fast_service();
    let a = service.encrypt_and_archive(b"same", &pass("pw")).await.unwrap();
    let b = service.encrypt_and_archive(b"same", &pass("pw")).await.unwrap();
    assert_ne!(a, b);

    let blob_a = ProtectedBlob::from_bytes(
        &container::unpack(&a[HEADER_SIZE..], ENTRY_NAME).unwrap(),
    )
    .unwrap();
    let blob_b = ProtectedBlob::from_bytes(
        &container::unpack(&b[HEADER_SIZE..], ENTRY_NAME).unwrap(),
    )
    .unwrap();
    assert_ne!(blob_a.salt, blob_b.salt);
    assert_ne!(blob_a.sealed.nonce, blob_b.sealed.nonce);

    let header_a = Header::parse(&a[..HEADER_SIZE]).unwrap();
    let header_b = Header::parse(&b[..HEADER_SIZE]).unwrap();
    assert_ne!(header_a.instance_id(), header_b.instance_id());
}

#[tokio::test]
async fn legacy_container_without_header_opens() {
    let service = fast_service();
    let passphrase = pass("old-file-pass");

    // Reproduce a pre-header file: bare zip, keyed with the legacy parameters.
    let salt = generate_salt();
    let key = derive_key(&passphrase, &salt, &KdfParams::LEGACY).unwrap();
    let sealed = cipher::encrypt(b"legacy database image", &key).unwrap();
    let bare = container::pack(ENTRY_NAME, &ProtectedBlob { salt, sealed }.to_bytes()).unwrap();

    assert!(EnvelopeLayout::detect(&bare).is_legacy());

    let opened = service.decrypt_and_open(&bare, &passphrase).await.unwrap();
    assert_eq!(opened, b"legacy database image");
}

#[tokio::test]
async fn garbage_input_is_format_error() {
    let service = fast_service();

    for input in [&b""[..], &b"not an archive"[..], &[0u8; 200][..]] {
        let err = service.decrypt_and_open(input, &pass("pw")).await.unwrap_err();
        assert!(err.is_format(), "expected format error, got {err}");
    }
}

#[tokio::test]
async fn header_with_corrupt_container_is_format_error() {
    let service = fast_service();
    let envelope = service.encrypt_and_archive(b"data", &pass("pw")).await.unwrap();

    let mut truncated = envelope[..HEADER_SIZE].to_vec();
    truncated.extend_from_slice(b"PK\x03\x04 truncated");

    let err = service
        .decrypt_and_open(&truncated, &pass("pw"))
        .await
        .unwrap_err();
    assert!(err.is_format());
}

#[tokio::test]
async fn container_missing_entry_is_format_error() {
    let service = fast_service();
    let header = Header::create(KdfParams::new(1024, 1, 1));
    let mut envelope = header.as_bytes().to_vec();
    envelope.extend_from_slice(&container::pack("other.db", b"whatever").unwrap());

    let err = service
        .decrypt_and_open(&envelope, &pass("pw"))
        .await
        .unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains(ENTRY_NAME));
}

#[tokio::test]
async fn tampered_ciphertext_is_authentication_error() {
    let service = fast_service();
    let envelope = service.encrypt_and_archive(b"payload", &pass("pw")).await.unwrap();

    // Rebuild the container with one flipped ciphertext bit.
    let mut blob = ProtectedBlob::from_bytes(
        &container::unpack(&envelope[HEADER_SIZE..], ENTRY_NAME).unwrap(),
    )
    .unwrap();
    blob.sealed.ciphertext[0] ^= 0x01;
    let mut tampered = envelope[..HEADER_SIZE].to_vec();
    tampered.extend_from_slice(&container::pack(ENTRY_NAME, &blob.to_bytes()).unwrap());

    let err = service
        .decrypt_and_open(&tampered, &pass("pw"))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn tampered_magic_falls_back_to_legacy_and_fails() {
    let service = fast_service();
    let mut envelope = service.encrypt_and_archive(b"payload", &pass("pw")).await.unwrap();
    envelope[0] ^= 0xFF;

    assert!(EnvelopeLayout::detect(&envelope).is_legacy());
    let err = service
        .decrypt_and_open(&envelope, &pass("pw"))
        .await
        .unwrap_err();
    assert!(err.is_format() || err.is_authentication());
}

#[tokio::test]
async fn snapshot_archive_and_restore() {
    let service = fast_service();
    let source = MemoryDb {
        image: b"SQLite format 3\0 SYS_TABLES".to_vec(),
        loads: 0,
    };

    let envelope = service
        .archive_snapshot(&source, &pass("pw"))
        .await
        .unwrap();

    let mut restored = MemoryDb::default();
    service
        .restore_snapshot(&mut restored, &envelope, &pass("pw"))
        .await
        .unwrap();
    assert_eq!(restored.image, source.image);
    assert_eq!(restored.loads, 1);
}

#[tokio::test]
async fn failed_restore_leaves_target_untouched() {
    let service = fast_service();
    let source = MemoryDb {
        image: b"new state".to_vec(),
        loads: 0,
    };
    let envelope = service.archive_snapshot(&source, &pass("pw")).await.unwrap();

    let mut target = MemoryDb {
        image: b"old state".to_vec(),
        loads: 0,
    };
    let err = service
        .restore_snapshot(&mut target, &envelope, &pass("nope"))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(target.image, b"old state");
    assert_eq!(target.loads, 0);
}

#[tokio::test]
async fn concurrent_calls_share_one_context() {
    let service = Arc::new(fast_service());
    let mut handles = Vec::new();
    for i in 0..4u8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let data = vec![i; 64];
            let envelope = service.encrypt_and_archive(&data, &pass("pw")).await?;
            let opened = service.decrypt_and_open(&envelope, &pass("pw")).await?;
            Ok::<_, LcaError>((data, opened))
        }));
    }
    for handle in handles {
        let (data, opened) = handle.await.unwrap().unwrap();
        assert_eq!(data, opened);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048), pw in "[ -~]{1,32}") {
        let ctx = CryptoContext::init(&KdfConfig {
            mem_cost_kib: 64,
            iterations: 1,
            parallelism: 1,
            ..KdfConfig::default()
        })
        .unwrap();
        let passphrase = SecretString::from(pw.as_str());

        let envelope = lca_archive::seal_envelope(&ctx, &data, &passphrase).unwrap();
        let opened = lca_archive::open_envelope(&ctx, &envelope, &passphrase).unwrap();
        prop_assert_eq!(opened, data);
    }
}
