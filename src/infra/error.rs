//! Error types for payload embedding operations.

use thiserror::Error;

/// Result type for payload operations
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Error taxonomy for embedding and extraction
#[derive(Error, Debug, miette::Diagnostic)]
pub enum PayloadError {
    #[error("not a PE file: {0}")]
    NotPeFile(String),

    #[error("truncated image: {0}")]
    Truncated(String),

    #[error("unrecognized optional header magic 0x{0:04x} (expected 0x10b or 0x20b)")]
    UnrecognizedOptionalHeaderMagic(u16),

    #[error("security directory out of bounds: {0}")]
    SecurityDirectoryOutOfBounds(String),

    #[error("catalog decode error: {0}")]
    CatalogDecodeError(String),

    #[error("catalog encode error: {0}")]
    CatalogEncodeError(String),

    #[error("payload {0:?} already embedded")]
    DuplicateKey(String),

    #[error("no payload named {0:?}")]
    NotFound(String),

    #[error("invalid payload name: {0}")]
    InvalidName(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for PayloadError {
    fn from(error: std::io::Error) -> Self {
        PayloadError::IoError(error.to_string())
    }
}
