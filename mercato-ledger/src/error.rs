use mercato_common::auth::CredentialError;
use mercato_common::ValidationError;
use thiserror::Error;

/// Why a byte sequence could not be turned into a record (or a record into
/// bytes). Every variant means the same thing to the store: the record is
/// corrupt and must not be trusted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Input ended in the middle of a record.
    #[error("Truncated record")]
    Truncated,

    /// A length prefix or element count is outside its sane bound.
    #[error("Field '{field}' length {len} exceeds bound {max}")]
    LengthOutOfBounds {
        field: &'static str,
        len: u64,
        max: u64,
    },

    /// A field decoded but holds a value that no valid record can have.
    #[error("Field '{field}' has invalid value: {detail}")]
    InvalidValue { field: &'static str, detail: String },

    /// Bytes were left over after a single-record decode.
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl CodecError {
    pub(crate) fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        CodecError::InvalidValue {
            field,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Corrupt record: {0}")]
    Corrupt(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
