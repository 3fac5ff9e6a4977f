//! Programmatic construction of NeoVM scripts.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use neo3_io::BinaryWriter;
use neo3_types::{ContractParameter, Hash160};

use crate::error::{ScriptError, ScriptResult};
use crate::interop::InteropService;
use crate::op_code::OpCode;

/// Call permissions granted to an emitted contract call, as pushed onto
/// the stack for `System.Contract.Call`.
pub const CALL_FLAGS_ALL: u8 = 0b0000_1111;

/// Builds a NeoVM script by appending opcodes and operands.
pub struct ScriptBuilder {
    writer: BinaryWriter,
}

impl ScriptBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            writer: BinaryWriter::new(),
        }
    }

    /// Appends a bare opcode.
    pub fn op_code(&mut self, op: OpCode) -> &mut Self {
        self.writer.write_u8(op.byte());
        self
    }

    /// Appends an opcode followed by its raw operand bytes.
    pub fn op_code_with_arg(&mut self, op: OpCode, operand: &[u8]) -> &mut Self {
        self.writer.write_u8(op.byte());
        self.writer.write_bytes(operand);
        self
    }

    /// Appends a syscall to the given interop service.
    pub fn sys_call(&mut self, service: InteropService) -> &mut Self {
        self.op_code_with_arg(OpCode::SYSCALL, &service.hash())
    }

    /// Pushes an integer using the smallest encoding.
    ///
    /// Values in `[-1, 16]` use the single-byte constants; anything else
    /// is sign-extended little-endian to the smallest of the `PUSHINT`
    /// widths. Values beyond 256 bits are rejected.
    pub fn push_integer(&mut self, value: &BigInt) -> ScriptResult<&mut Self> {
        if let Some(small) = value.to_i32() {
            if small == -1 {
                return Ok(self.op_code(OpCode::PUSHM1));
            }
            if (0..=16).contains(&small) {
                let byte = OpCode::PUSH0.byte() + small as u8;
                self.writer.write_u8(byte);
                return Ok(self);
            }
        }

        let mut bytes = value.to_signed_bytes_le();
        let padded_len = match bytes.len() {
            0..=1 => 1,
            2 => 2,
            3..=4 => 4,
            5..=8 => 8,
            9..=16 => 16,
            17..=32 => 32,
            _ => return Err(ScriptError::number_out_of_range(value)),
        };
        let sign_fill = if value.sign() == num_bigint::Sign::Minus {
            0xff
        } else {
            0x00
        };
        bytes.resize(padded_len, sign_fill);

        let op = match padded_len {
            1 => OpCode::PUSHINT8,
            2 => OpCode::PUSHINT16,
            4 => OpCode::PUSHINT32,
            8 => OpCode::PUSHINT64,
            16 => OpCode::PUSHINT128,
            _ => OpCode::PUSHINT256,
        };
        Ok(self.op_code_with_arg(op, &bytes))
    }

    /// Pushes an `i64` using the smallest encoding.
    pub fn push_int(&mut self, value: i64) -> &mut Self {
        // Any i64 fits into PUSHINT64, so this cannot fail.
        let _ = self.push_integer(&BigInt::from(value));
        self
    }

    /// Pushes a boolean constant.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.op_code(if value { OpCode::PUSHT } else { OpCode::PUSHF })
    }

    /// Pushes a null reference.
    pub fn push_null(&mut self) -> &mut Self {
        self.op_code(OpCode::PUSHNULL)
    }

    /// Pushes a byte string with the smallest `PUSHDATA` form.
    pub fn push_data(&mut self, data: &[u8]) -> &mut Self {
        if data.len() < 0x100 {
            self.op_code(OpCode::PUSHDATA1);
            self.writer.write_u8(data.len() as u8);
        } else if data.len() < 0x1_0000 {
            self.op_code(OpCode::PUSHDATA2);
            self.writer.write_u16(data.len() as u16);
        } else {
            self.op_code(OpCode::PUSHDATA4);
            self.writer.write_u32(data.len() as u32);
        }
        self.writer.write_bytes(data);
        self
    }

    /// Pushes a UTF-8 string as a byte string.
    pub fn push_string(&mut self, value: &str) -> &mut Self {
        self.push_data(value.as_bytes())
    }

    /// Pushes a contract parameter, recursing into arrays and maps.
    pub fn push_param(&mut self, param: &ContractParameter) -> ScriptResult<&mut Self> {
        match param {
            ContractParameter::Any => {
                self.push_null();
            }
            ContractParameter::Boolean(b) => {
                self.push_bool(*b);
            }
            ContractParameter::Integer(i) => {
                self.push_integer(i)?;
            }
            ContractParameter::ByteArray(bytes) | ContractParameter::Signature(bytes) => {
                self.push_data(bytes);
            }
            ContractParameter::String(s) => {
                self.push_string(s);
            }
            ContractParameter::Hash160(h) => {
                self.push_data(h.as_bytes());
            }
            ContractParameter::Hash256(h) => {
                self.push_data(h.as_bytes());
            }
            ContractParameter::PublicKey(k) => {
                self.push_data(k.as_bytes());
            }
            ContractParameter::Array(items) => {
                self.push_params(items)?;
            }
            ContractParameter::Map(entries) => {
                for (key, value) in entries {
                    self.push_param(value)?;
                    self.push_param(key)?;
                }
                self.push_int(entries.len() as i64);
                self.op_code(OpCode::PACKMAP);
            }
        }
        Ok(self)
    }

    /// Pushes a list of parameters in reverse order and packs them into
    /// an array.
    pub fn push_params(&mut self, params: &[ContractParameter]) -> ScriptResult<&mut Self> {
        if params.is_empty() {
            return Ok(self.op_code(OpCode::NEWARRAY0));
        }
        for param in params.iter().rev() {
            self.push_param(param)?;
        }
        self.pack(params.len())
    }

    /// Pushes the item count and a `PACK`.
    pub fn pack(&mut self, count: usize) -> ScriptResult<&mut Self> {
        self.push_int(count as i64);
        Ok(self.op_code(OpCode::PACK))
    }

    /// Emits `NEWARRAY` for an array of `n` null slots.
    pub fn new_array(&mut self, n: usize) -> &mut Self {
        self.push_int(n as i64);
        self.op_code(OpCode::NEWARRAY)
    }

    /// Emits a full contract call: packed parameters, call flags, method
    /// name, target hash, and the `System.Contract.Call` syscall.
    pub fn contract_call(
        &mut self,
        hash: &Hash160,
        method: &str,
        params: &[ContractParameter],
    ) -> ScriptResult<&mut Self> {
        self.contract_call_with_flags(hash, method, params, CALL_FLAGS_ALL)
    }

    /// As [`contract_call`](Self::contract_call) with explicit call flags.
    pub fn contract_call_with_flags(
        &mut self,
        hash: &Hash160,
        method: &str,
        params: &[ContractParameter],
        call_flags: u8,
    ) -> ScriptResult<&mut Self> {
        self.push_params(params)?;
        self.push_int(call_flags as i64);
        self.push_string(method);
        self.push_data(hash.as_bytes());
        Ok(self.sys_call(InteropService::SystemContractCall))
    }

    /// The bytes emitted so far.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.writer.to_bytes()
    }

    /// The current script length in bytes.
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Consumes the builder, returning the script bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
