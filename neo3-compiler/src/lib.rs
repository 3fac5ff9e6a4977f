//! Compiles JVM class structures to NeoVM bytecode.
//!
//! The input is a structured representation of compiled classes (fields,
//! methods, instruction lists with labels and local-variable tables); the
//! output is a NEF file plus the contract manifest. Source-level
//! annotations arrive as a [`Pragmas`] map keyed by fully qualified
//! symbol.

pub mod compiler;
pub mod error;
pub mod instruction;
pub mod jvm;
pub mod lowering;
pub mod manifest;
pub mod method;
pub mod module;
pub mod pragma;

pub use compiler::{CompilationResult, Compiler};
pub use error::{CompilerError, CompilerResult};
pub use instruction::{FixupTarget, NeoInstruction};
pub use jvm::{
    ClassRegistry, Cmp, JvmClass, JvmField, JvmFieldRef, JvmInsn, JvmLocalVar, JvmMethod,
    JvmMethodRef, JvmTryCatch, JvmType, LabelId,
};
pub use method::{MethodId, NeoMethod};
pub use module::{NeoEvent, NeoModule};
pub use pragma::{ManifestPragma, PragmaEffect, Pragmas};

/// The compiler name written into produced NEF files.
pub const COMPILER_NAME: &str = "neo3-compiler-0.1.0";

/// Upper bound on method parameters.
pub const MAX_PARAMS: usize = 255;

/// Upper bound on local variables per method.
pub const MAX_LOCALS: usize = 255;

/// Upper bound on static fields per contract.
pub const MAX_STATIC_FIELDS: usize = 255;
