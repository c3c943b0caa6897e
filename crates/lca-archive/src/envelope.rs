//! Envelope framing: optional header in front of the container, and the
//! protected blob stored inside it.

use lca_core::{LcaError, LcaResult};
use lca_crypto::{CryptoContext, Header, KdfParams, Sealed, HEADER_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// What the leading bytes of an envelope turned out to be.
#[derive(Debug, Clone)]
pub enum EnvelopeLayout<'a> {
    /// A valid header followed by the container.
    Framed { header: Header, container: &'a [u8] },
    /// No header; the whole input is the container.
    Legacy { container: &'a [u8] },
}

impl<'a> EnvelopeLayout<'a> {
    pub fn detect(bytes: &'a [u8]) -> Self {
        let header = bytes.get(..HEADER_SIZE).and_then(Header::try_parse);
        match header {
            Some(header) => Self::Framed {
                header,
                container: &bytes[HEADER_SIZE..],
            },
            None => Self::Legacy { container: bytes },
        }
    }

    pub fn container(&self) -> &'a [u8] {
        match self {
            Self::Framed { container, .. } | Self::Legacy { container } => container,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        match self {
            Self::Framed { header, .. } => Some(header),
            Self::Legacy { .. } => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }

    /// KDF parameters to re-derive the key with. Header values are untrusted
    /// input and are checked before use.
    pub fn kdf_params(&self, ctx: &CryptoContext) -> LcaResult<KdfParams> {
        match self {
            Self::Framed { header, .. } => {
                if header.cipher_suite().is_none() {
                    return Err(LcaError::Format(format!(
                        "unsupported cipher flag {}",
                        header.cipher_flag()
                    )));
                }
                let params = header.kdf_params();
                ctx.check_untrusted_params(&params)?;
                Ok(params)
            }
            Self::Legacy { .. } => Ok(ctx.legacy_params()),
        }
    }
}

/// `header || container`
pub fn assemble(header: &Header, container: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + container.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(container);
    out
}

/// Contents of the container entry: `salt || nonce || ciphertext || tag`
#[derive(Debug, Clone)]
pub struct ProtectedBlob {
    pub salt: [u8; SALT_SIZE],
    pub sealed: Sealed,
}

impl ProtectedBlob {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + self.sealed.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.sealed.nonce);
        out.extend_from_slice(&self.sealed.ciphertext);
        out
    }

    pub fn from_bytes(data: &[u8]) -> LcaResult<Self> {
        let min = SALT_SIZE + NONCE_SIZE + TAG_SIZE;
        if data.len() < min {
            return Err(LcaError::Format(format!(
                "protected entry too short: {} bytes (minimum {min})",
                data.len()
            )));
        }
        let (salt_bytes, rest) = data.split_at(SALT_SIZE);
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(salt_bytes);
        Ok(Self {
            salt,
            sealed: Sealed::from_bytes(rest)?,
        })
    }
}
