//! Error types for contract artifacts.

use thiserror::Error;

/// Errors raised while building contract artifacts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The compiler name did not fit the fixed-width NEF field.
    #[error("compiler string of {actual} bytes exceeds the {max}-byte NEF field")]
    CompilerNameTooLong { actual: usize, max: usize },

    /// The contract script exceeded the NEF limit.
    #[error("script of {actual} bytes exceeds the maximum of {max}")]
    ScriptTooLong { actual: usize, max: usize },

    /// The contract script was empty.
    #[error("a NEF file requires a non-empty script")]
    EmptyScript,
}

/// Result type for contract artifact operations.
pub type ContractResult<T> = std::result::Result<T, ContractError>;
