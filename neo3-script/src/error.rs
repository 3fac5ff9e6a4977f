//! Error types for script construction and parsing.

use thiserror::Error;

/// Errors raised while building or inspecting NeoVM scripts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// An integer push exceeded the largest representable width.
    #[error("integer does not fit into 32 bytes: {value}")]
    NumberOutOfRange { value: String },

    /// A multi-signature configuration was invalid.
    #[error("invalid multi-sig configuration: {reason}")]
    InvalidMultiSig { reason: String },

    /// A script did not have the expected shape.
    #[error("script is not a valid {expected} script: {reason}")]
    InvalidScriptFormat {
        expected: &'static str,
        reason: String,
    },

    /// A signature had the wrong byte length.
    #[error("invalid signature length: expected 64 bytes, got {actual}")]
    InvalidSignatureLength { actual: usize },
}

impl ScriptError {
    pub fn number_out_of_range(value: impl ToString) -> Self {
        Self::NumberOutOfRange {
            value: value.to_string(),
        }
    }

    pub fn invalid_multi_sig(reason: impl Into<String>) -> Self {
        Self::InvalidMultiSig {
            reason: reason.into(),
        }
    }

    pub fn invalid_script_format(expected: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidScriptFormat {
            expected,
            reason: reason.into(),
        }
    }
}

/// Result type for script operations.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;
