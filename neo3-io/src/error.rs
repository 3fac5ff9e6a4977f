//! Error types for binary serialization.

use thiserror::Error;

/// Errors raised while reading or writing wire-format data.
///
/// Deserialization errors carry the name of the offending field and the
/// reader offset at which the failure occurred.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// The input ended before the requested number of bytes could be read.
    #[error("unexpected end of stream: needed {needed} more bytes for {field} at offset {offset}")]
    EndOfStream {
        field: &'static str,
        needed: usize,
        offset: usize,
    },

    /// A discriminant or marker byte had an unknown value.
    #[error("unexpected value for {field} at offset {offset}: {value:#04x}")]
    UnexpectedDiscriminant {
        field: &'static str,
        offset: usize,
        value: u8,
    },

    /// A length or count exceeded its protocol bound.
    #[error("{field} at offset {offset} exceeds the allowed maximum: {actual} > {max}")]
    ExceedsLimit {
        field: &'static str,
        offset: usize,
        actual: u64,
        max: u64,
    },

    /// The data was structurally invalid for the target type.
    #[error("invalid data for {field} at offset {offset}: {reason}")]
    InvalidData {
        field: &'static str,
        offset: usize,
        reason: String,
    },

    /// A checksum did not match the recomputed value.
    #[error("checksum mismatch for {field}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        field: &'static str,
        expected: String,
        computed: String,
    },

    /// Trailing bytes were left after a full deserialization.
    #[error("{remaining} trailing bytes after deserializing {field}")]
    TrailingBytes { field: &'static str, remaining: usize },
}

impl IoError {
    pub fn end_of_stream(field: &'static str, needed: usize, offset: usize) -> Self {
        Self::EndOfStream {
            field,
            needed,
            offset,
        }
    }

    pub fn unexpected_discriminant(field: &'static str, offset: usize, value: u8) -> Self {
        Self::UnexpectedDiscriminant {
            field,
            offset,
            value,
        }
    }

    pub fn exceeds_limit(field: &'static str, offset: usize, actual: u64, max: u64) -> Self {
        Self::ExceedsLimit {
            field,
            offset,
            actual,
            max,
        }
    }

    pub fn invalid_data(field: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field,
            offset,
            reason: reason.into(),
        }
    }

    pub fn checksum_mismatch(
        field: &'static str,
        expected: impl Into<String>,
        computed: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            field,
            expected: expected.into(),
            computed: computed.into(),
        }
    }
}

/// Result type for serialization operations.
pub type IoResult<T> = std::result::Result<T, IoError>;
