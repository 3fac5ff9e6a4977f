//! NeoVM opcodes and script construction.
//!
//! This crate provides the N3 instruction set with operand metadata, the
//! interop service hashes, a [`ScriptBuilder`] for emitting call and push
//! sequences, and the invocation/verification script types that identify
//! and authorize accounts.

pub mod error;
pub mod interop;
pub mod invocation_script;
pub mod op_code;
pub mod script_builder;
pub mod stack_item_type;
pub mod verification_script;

pub use error::{ScriptError, ScriptResult};
pub use interop::InteropService;
pub use invocation_script::InvocationScript;
pub use op_code::{OpCode, OperandSize};
pub use script_builder::ScriptBuilder;
pub use stack_item_type::StackItemType;
pub use verification_script::VerificationScript;

/// Upper bound on the number of keys in a multi-signature account.
pub const MAX_MULTISIG_KEYS: usize = 1024;
