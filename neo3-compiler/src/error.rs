//! Compiler diagnostics.

use thiserror::Error;

/// Errors raised while compiling a contract class.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    /// A referenced class is not in the registry.
    #[error("class {name} was not provided to the compiler")]
    UnknownClass { name: String },

    /// A referenced method could not be resolved.
    #[error("could not find method {method} on class {class}")]
    UnknownMethod { class: String, method: String },

    /// An instruction has no lowering rule.
    #[error("unsupported instruction {instruction} in {method}")]
    UnsupportedInstruction { instruction: String, method: String },

    /// A construct is not allowed in contracts.
    #[error("{0}")]
    UnsupportedConstruct(String),

    /// A counted resource exceeded its slot bound.
    #[error("{what} count {actual} exceeds the maximum of {max}")]
    TooMany {
        what: &'static str,
        actual: usize,
        max: usize,
    },

    /// An opcode pragma carried the wrong number of operand bytes.
    #[error("opcode {opcode} was used with {actual} operand bytes but takes {expected}")]
    OperandSizeMismatch {
        opcode: String,
        expected: usize,
        actual: usize,
    },

    /// A contract-hash pragma had the wrong length.
    #[error("the script hash on contract class {class} does not have the correct length")]
    BadContractHash { class: String },

    /// A jump or call target could not be resolved at finalization.
    #[error("unresolved {what} in method {method}")]
    UnresolvedTarget { what: &'static str, method: String },

    /// Building the NEF container failed.
    #[error("failed to assemble the NEF file: {0}")]
    Nef(String),
}

impl CompilerError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(message.into())
    }

    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }
}

/// Result type for compilation.
pub type CompilerResult<T> = std::result::Result<T, CompilerError>;
