use thiserror::Error;

pub type LcaResult<T> = Result<T, LcaError>;

#[derive(Debug, Error)]
pub enum LcaError {
    /// Malformed header, container, or payload framing.
    #[error("format error: {0}")]
    Format(String),

    /// AEAD tag verification failed. Deliberately says nothing about whether
    /// the passphrase or the data was at fault.
    #[error("authentication failed: wrong passphrase or corrupted data")]
    Authentication,

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("key derivation error: {0}")]
    Kdf(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LcaError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
