//! The NEO Executable Format (NEF3) container.
//!
//! Layout:
//!
//! | Field    | Type          |
//! |----------|---------------|
//! | Magic    | `u32`         |
//! | Compiler | `byte[64]`    |
//! | Reserve  | `u16` (zero)  |
//! | Tokens   | method tokens |
//! | Reserve  | `u16` (zero)  |
//! | Script   | var bytes     |
//! | Checksum | `u32`         |
//!
//! The checksum is the first four bytes of the double SHA-256 of
//! everything preceding it.

use neo3_io::{
    var_size_bytes, var_size_list, BinaryWriter, IoError, IoResult, MemoryReader, Serializable,
};
use neo3_types::hash::hash256;
use neo3_types::Hash160;

use crate::error::{ContractError, ContractResult};
use crate::method_token::MethodToken;

/// "NEF3" in little-endian.
pub const NEF_MAGIC: u32 = 0x3346454E;

/// Width of the fixed compiler field.
pub const COMPILER_FIELD_SIZE: usize = 64;

/// Maximum contract script length.
pub const MAX_SCRIPT_LENGTH: usize = 512 * 1024;

/// Maximum total NEF file size.
pub const MAX_NEF_FILE_SIZE: usize = 1 << 20;

/// Maximum number of method tokens.
const MAX_TOKEN_COUNT: usize = 128;

const CHECKSUM_SIZE: usize = 4;

/// A parsed or freshly built NEF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NefFile {
    compiler: String,
    tokens: Vec<MethodToken>,
    script: Vec<u8>,
    checksum: [u8; CHECKSUM_SIZE],
}

impl NefFile {
    /// Builds a NEF file from its parts, computing the checksum.
    pub fn new(
        compiler: impl Into<String>,
        tokens: Vec<MethodToken>,
        script: Vec<u8>,
    ) -> ContractResult<Self> {
        let compiler = compiler.into();
        if compiler.len() > COMPILER_FIELD_SIZE {
            return Err(ContractError::CompilerNameTooLong {
                actual: compiler.len(),
                max: COMPILER_FIELD_SIZE,
            });
        }
        if script.is_empty() {
            return Err(ContractError::EmptyScript);
        }
        if script.len() > MAX_SCRIPT_LENGTH {
            return Err(ContractError::ScriptTooLong {
                actual: script.len(),
                max: MAX_SCRIPT_LENGTH,
            });
        }
        let mut file = Self {
            compiler,
            tokens,
            script,
            checksum: [0; CHECKSUM_SIZE],
        };
        file.checksum = file.compute_checksum();
        Ok(file)
    }

    /// The compiler name and version string.
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// The method tokens.
    pub fn tokens(&self) -> &[MethodToken] {
        &self.tokens
    }

    /// The contract script.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// The stored checksum bytes.
    pub fn checksum(&self) -> &[u8; CHECKSUM_SIZE] {
        &self.checksum
    }

    /// The hash of the contained script.
    pub fn script_hash(&self) -> Hash160 {
        Hash160::from_script(&self.script)
    }

    /// Recomputes the checksum over the serialized file body.
    pub fn compute_checksum(&self) -> [u8; CHECKSUM_SIZE] {
        let bytes = self.to_array();
        Self::checksum_from_bytes(&bytes)
    }

    /// Computes the checksum of serialized NEF bytes (the last four bytes
    /// are excluded from the digest).
    pub fn checksum_from_bytes(bytes: &[u8]) -> [u8; CHECKSUM_SIZE] {
        let body = &bytes[..bytes.len() - CHECKSUM_SIZE];
        let digest = hash256(body);
        let mut out = [0u8; CHECKSUM_SIZE];
        out.copy_from_slice(&digest[..CHECKSUM_SIZE]);
        out
    }
}

impl Serializable for NefFile {
    fn size(&self) -> usize {
        4 + COMPILER_FIELD_SIZE
            + 2
            + var_size_list(&self.tokens)
            + 2
            + var_size_bytes(&self.script)
            + CHECKSUM_SIZE
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u32(NEF_MAGIC);
        writer.write_fixed_string(&self.compiler, COMPILER_FIELD_SIZE);
        writer.write_u16(0);
        writer.write_serializable_list(&self.tokens);
        writer.write_u16(0);
        writer.write_var_bytes(&self.script);
        writer.write_bytes(&self.checksum);
    }

    fn deserialize(reader: &mut MemoryReader<'_>) -> IoResult<Self> {
        if reader.len() > MAX_NEF_FILE_SIZE {
            return Err(IoError::exceeds_limit(
                "NEF file",
                0,
                reader.len() as u64,
                MAX_NEF_FILE_SIZE as u64,
            ));
        }
        let magic_offset = reader.position();
        let magic = reader.read_u32("NEF magic")?;
        if magic != NEF_MAGIC {
            return Err(IoError::invalid_data(
                "NEF magic",
                magic_offset,
                format!("expected {NEF_MAGIC:#010x}, got {magic:#010x}"),
            ));
        }
        let compiler = reader.read_fixed_string("NEF compiler", COMPILER_FIELD_SIZE)?;

        let reserved_offset = reader.position();
        if reader.read_u16("NEF reserved")? != 0 {
            return Err(IoError::invalid_data(
                "NEF reserved",
                reserved_offset,
                "reserved bytes must be zero",
            ));
        }
        let tokens = MethodToken::deserialize_list(reader, "NEF tokens", MAX_TOKEN_COUNT)?;
        let reserved_offset = reader.position();
        if reader.read_u16("NEF reserved")? != 0 {
            return Err(IoError::invalid_data(
                "NEF reserved",
                reserved_offset,
                "reserved bytes must be zero",
            ));
        }

        let script_offset = reader.position();
        let script = reader.read_var_bytes("NEF script", MAX_SCRIPT_LENGTH)?;
        if script.is_empty() {
            return Err(IoError::invalid_data(
                "NEF script",
                script_offset,
                "script must not be empty",
            ));
        }

        let checksum_bytes = reader.read_bytes("NEF checksum", CHECKSUM_SIZE)?;
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&checksum_bytes);

        let file = Self {
            compiler,
            tokens,
            script,
            checksum,
        };
        let computed = file.compute_checksum();
        if computed != checksum {
            return Err(IoError::checksum_mismatch(
                "NEF checksum",
                hex::encode(checksum),
                hex::encode(computed),
            ));
        }
        Ok(file)
    }
}
