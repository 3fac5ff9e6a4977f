//! Error types for transaction assembly and broadcasting.

use thiserror::Error;

use neo3_io::IoError;
use neo3_script::ScriptError;
use neo3_types::TypeError;

/// Errors raised while configuring, building, signing, or sending a
/// transaction.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The builder was configured inconsistently.
    #[error("transaction configuration error: {0}")]
    Config(String),

    /// An operation was attempted in the wrong lifecycle state.
    #[error("{0}")]
    State(String),

    /// The node's VM faulted while estimating the system fee.
    #[error("the vm exited due to the following exception: {0}")]
    VmFault(String),

    /// The node rejected the transaction on broadcast.
    #[error("transaction rejected by the node: {0}")]
    Rejected(String),

    /// An invocation result had an unexpected shape.
    #[error("unexpected invocation result: {0}")]
    UnexpectedResult(String),

    /// A signing account has no private key.
    #[error("cannot create transaction signature because account {address} does not hold a private key")]
    MissingPrivateKey { address: String },

    /// Too few signatures were provided for a multi-sig witness.
    #[error("{provided} signatures provided but {required} are required")]
    InsufficientSignatures { required: usize, provided: usize },

    /// A node request failed at the transport level.
    #[error("node request failed: {0}")]
    Client(String),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl TransactionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = std::result::Result<T, TransactionError>;
