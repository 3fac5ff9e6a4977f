//! The N3 NeoVM instruction set.
//!
//! Byte values and operand widths follow the Neo N3 protocol. Opcodes are
//! grouped into constants, flow control, stack, slot, splice, bitwise,
//! numeric, compound-type, and type operations.

/// A NeoVM instruction opcode.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Constants
    /// Push a signed 8-bit integer.
    PUSHINT8 = 0x00,
    /// Push a signed 16-bit integer.
    PUSHINT16 = 0x01,
    /// Push a signed 32-bit integer.
    PUSHINT32 = 0x02,
    /// Push a signed 64-bit integer.
    PUSHINT64 = 0x03,
    /// Push a signed 128-bit integer.
    PUSHINT128 = 0x04,
    /// Push a signed 256-bit integer.
    PUSHINT256 = 0x05,
    /// Push the boolean `true`.
    PUSHT = 0x08,
    /// Push the boolean `false`.
    PUSHF = 0x09,
    /// Push a pointer to an offset in the current script.
    PUSHA = 0x0A,
    /// Push a null reference.
    PUSHNULL = 0x0B,
    /// Push data with a 1-byte length prefix.
    PUSHDATA1 = 0x0C,
    /// Push data with a 2-byte length prefix.
    PUSHDATA2 = 0x0D,
    /// Push data with a 4-byte length prefix.
    PUSHDATA4 = 0x0E,
    /// Push the integer -1.
    PUSHM1 = 0x0F,
    /// Push the integer 0.
    PUSH0 = 0x10,
    /// Push the integer 1.
    PUSH1 = 0x11,
    /// Push the integer 2.
    PUSH2 = 0x12,
    /// Push the integer 3.
    PUSH3 = 0x13,
    /// Push the integer 4.
    PUSH4 = 0x14,
    /// Push the integer 5.
    PUSH5 = 0x15,
    /// Push the integer 6.
    PUSH6 = 0x16,
    /// Push the integer 7.
    PUSH7 = 0x17,
    /// Push the integer 8.
    PUSH8 = 0x18,
    /// Push the integer 9.
    PUSH9 = 0x19,
    /// Push the integer 10.
    PUSH10 = 0x1A,
    /// Push the integer 11.
    PUSH11 = 0x1B,
    /// Push the integer 12.
    PUSH12 = 0x1C,
    /// Push the integer 13.
    PUSH13 = 0x1D,
    /// Push the integer 14.
    PUSH14 = 0x1E,
    /// Push the integer 15.
    PUSH15 = 0x1F,
    /// Push the integer 16.
    PUSH16 = 0x20,

    // Flow control
    /// No operation.
    NOP = 0x21,
    /// Unconditional jump, 1-byte offset.
    JMP = 0x22,
    /// Unconditional jump, 4-byte offset.
    JMP_L = 0x23,
    /// Jump if the top of the stack is true, 1-byte offset.
    JMPIF = 0x24,
    /// Jump if the top of the stack is true, 4-byte offset.
    JMPIF_L = 0x25,
    /// Jump if the top of the stack is false, 1-byte offset.
    JMPIFNOT = 0x26,
    /// Jump if the top of the stack is false, 4-byte offset.
    JMPIFNOT_L = 0x27,
    /// Jump if the top two values are equal, 1-byte offset.
    JMPEQ = 0x28,
    /// Jump if the top two values are equal, 4-byte offset.
    JMPEQ_L = 0x29,
    /// Jump if the top two values differ, 1-byte offset.
    JMPNE = 0x2A,
    /// Jump if the top two values differ, 4-byte offset.
    JMPNE_L = 0x2B,
    /// Jump if a > b, 1-byte offset.
    JMPGT = 0x2C,
    /// Jump if a > b, 4-byte offset.
    JMPGT_L = 0x2D,
    /// Jump if a >= b, 1-byte offset.
    JMPGE = 0x2E,
    /// Jump if a >= b, 4-byte offset.
    JMPGE_L = 0x2F,
    /// Jump if a < b, 1-byte offset.
    JMPLT = 0x30,
    /// Jump if a < b, 4-byte offset.
    JMPLT_L = 0x31,
    /// Jump if a <= b, 1-byte offset.
    JMPLE = 0x32,
    /// Jump if a <= b, 4-byte offset.
    JMPLE_L = 0x33,
    /// Call a function, 1-byte offset.
    CALL = 0x34,
    /// Call a function, 4-byte offset.
    CALL_L = 0x35,
    /// Call the function whose pointer is on the stack.
    CALLA = 0x36,
    /// Call a method token.
    CALLT = 0x37,
    /// Abort execution.
    ABORT = 0x38,
    /// Abort if the top of the stack is false.
    ASSERT = 0x39,
    /// Throw the top of the stack as an exception.
    THROW = 0x3A,
    /// Begin a try block, 1-byte catch and finally offsets.
    TRY = 0x3B,
    /// Begin a try block, 4-byte catch and finally offsets.
    TRY_L = 0x3C,
    /// Leave a try block, 1-byte offset.
    ENDTRY = 0x3D,
    /// Leave a try block, 4-byte offset.
    ENDTRY_L = 0x3E,
    /// End a finally block.
    ENDFINALLY = 0x3F,
    /// Return from the current context.
    RET = 0x40,
    /// Invoke an interop service.
    SYSCALL = 0x41,

    // Stack
    /// Push the number of stack items.
    DEPTH = 0x43,
    /// Remove the top stack item.
    DROP = 0x45,
    /// Remove the second stack item.
    NIP = 0x46,
    /// Remove the item at index n.
    XDROP = 0x48,
    /// Clear the stack.
    CLEAR = 0x49,
    /// Duplicate the top stack item.
    DUP = 0x4A,
    /// Copy the second item to the top.
    OVER = 0x4B,
    /// Copy the item at index n to the top.
    PICK = 0x4D,
    /// Copy the top item below the second item.
    TUCK = 0x4E,
    /// Swap the top two items.
    SWAP = 0x50,
    /// Rotate the top three items.
    ROT = 0x51,
    /// Move the item at index n to the top.
    ROLL = 0x52,
    /// Reverse the top three items.
    REVERSE3 = 0x53,
    /// Reverse the top four items.
    REVERSE4 = 0x54,
    /// Reverse the top n items.
    REVERSEN = 0x55,

    // Slot
    /// Initialize the static field slot with n entries.
    INITSSLOT = 0x56,
    /// Initialize local variable and argument slots.
    INITSLOT = 0x57,
    /// Load static field 0.
    LDSFLD0 = 0x58,
    /// Load static field 1.
    LDSFLD1 = 0x59,
    /// Load static field 2.
    LDSFLD2 = 0x5A,
    /// Load static field 3.
    LDSFLD3 = 0x5B,
    /// Load static field 4.
    LDSFLD4 = 0x5C,
    /// Load static field 5.
    LDSFLD5 = 0x5D,
    /// Load static field 6.
    LDSFLD6 = 0x5E,
    /// Load the static field named by the operand.
    LDSFLD = 0x5F,
    /// Store to static field 0.
    STSFLD0 = 0x60,
    /// Store to static field 1.
    STSFLD1 = 0x61,
    /// Store to static field 2.
    STSFLD2 = 0x62,
    /// Store to static field 3.
    STSFLD3 = 0x63,
    /// Store to static field 4.
    STSFLD4 = 0x64,
    /// Store to static field 5.
    STSFLD5 = 0x65,
    /// Store to static field 6.
    STSFLD6 = 0x66,
    /// Store to the static field named by the operand.
    STSFLD = 0x67,
    /// Load local variable 0.
    LDLOC0 = 0x68,
    /// Load local variable 1.
    LDLOC1 = 0x69,
    /// Load local variable 2.
    LDLOC2 = 0x6A,
    /// Load local variable 3.
    LDLOC3 = 0x6B,
    /// Load local variable 4.
    LDLOC4 = 0x6C,
    /// Load local variable 5.
    LDLOC5 = 0x6D,
    /// Load local variable 6.
    LDLOC6 = 0x6E,
    /// Load the local variable named by the operand.
    LDLOC = 0x6F,
    /// Store to local variable 0.
    STLOC0 = 0x70,
    /// Store to local variable 1.
    STLOC1 = 0x71,
    /// Store to local variable 2.
    STLOC2 = 0x72,
    /// Store to local variable 3.
    STLOC3 = 0x73,
    /// Store to local variable 4.
    STLOC4 = 0x74,
    /// Store to local variable 5.
    STLOC5 = 0x75,
    /// Store to local variable 6.
    STLOC6 = 0x76,
    /// Store to the local variable named by the operand.
    STLOC = 0x77,
    /// Load argument 0.
    LDARG0 = 0x78,
    /// Load argument 1.
    LDARG1 = 0x79,
    /// Load argument 2.
    LDARG2 = 0x7A,
    /// Load argument 3.
    LDARG3 = 0x7B,
    /// Load argument 4.
    LDARG4 = 0x7C,
    /// Load argument 5.
    LDARG5 = 0x7D,
    /// Load argument 6.
    LDARG6 = 0x7E,
    /// Load the argument named by the operand.
    LDARG = 0x7F,
    /// Store to argument 0.
    STARG0 = 0x80,
    /// Store to argument 1.
    STARG1 = 0x81,
    /// Store to argument 2.
    STARG2 = 0x82,
    /// Store to argument 3.
    STARG3 = 0x83,
    /// Store to argument 4.
    STARG4 = 0x84,
    /// Store to argument 5.
    STARG5 = 0x85,
    /// Store to argument 6.
    STARG6 = 0x86,
    /// Store to the argument named by the operand.
    STARG = 0x87,

    // Splice
    /// Create a buffer of the given size.
    NEWBUFFER = 0x88,
    /// Copy a memory range between buffers.
    MEMCPY = 0x89,
    /// Concatenate two byte strings.
    CAT = 0x8B,
    /// Extract a substring.
    SUBSTR = 0x8C,
    /// Take the leftmost n bytes.
    LEFT = 0x8D,
    /// Take the rightmost n bytes.
    RIGHT = 0x8E,

    // Bitwise
    /// Bitwise NOT.
    INVERT = 0x90,
    /// Bitwise AND.
    AND = 0x91,
    /// Bitwise OR.
    OR = 0x92,
    /// Bitwise XOR.
    XOR = 0x93,
    /// Reference equality.
    EQUAL = 0x97,
    /// Reference inequality.
    NOTEQUAL = 0x98,

    // Numeric
    /// Sign of the top item.
    SIGN = 0x99,
    /// Absolute value.
    ABS = 0x9A,
    /// Arithmetic negation.
    NEGATE = 0x9B,
    /// Increment by one.
    INC = 0x9C,
    /// Decrement by one.
    DEC = 0x9D,
    /// Addition.
    ADD = 0x9E,
    /// Subtraction.
    SUB = 0x9F,
    /// Multiplication.
    MUL = 0xA0,
    /// Division.
    DIV = 0xA1,
    /// Remainder.
    MOD = 0xA2,
    /// Exponentiation.
    POW = 0xA3,
    /// Integer square root.
    SQRT = 0xA4,
    /// Modular multiplication.
    MODMUL = 0xA5,
    /// Modular exponentiation.
    MODPOW = 0xA6,
    /// Shift left.
    SHL = 0xA8,
    /// Shift right.
    SHR = 0xA9,
    /// Boolean NOT.
    NOT = 0xAA,
    /// Boolean AND.
    BOOLAND = 0xAB,
    /// Boolean OR.
    BOOLOR = 0xAC,
    /// True if the top item is nonzero.
    NZ = 0xB1,
    /// Numeric equality.
    NUMEQUAL = 0xB3,
    /// Numeric inequality.
    NUMNOTEQUAL = 0xB4,
    /// Less than.
    LT = 0xB5,
    /// Less than or equal.
    LE = 0xB6,
    /// Greater than.
    GT = 0xB7,
    /// Greater than or equal.
    GE = 0xB8,
    /// Minimum of two values.
    MIN = 0xB9,
    /// Maximum of two values.
    MAX = 0xBA,
    /// True if a value lies within a half-open range.
    WITHIN = 0xBB,

    // Compound types
    /// Pack key-value pairs into a map.
    PACKMAP = 0xBE,
    /// Pack items into a struct.
    PACKSTRUCT = 0xBF,
    /// Pack items into an array.
    PACK = 0xC0,
    /// Unpack an array onto the stack.
    UNPACK = 0xC1,
    /// Create an empty array.
    NEWARRAY0 = 0xC2,
    /// Create an array of n nulls.
    NEWARRAY = 0xC3,
    /// Create a typed array of n default values.
    NEWARRAY_T = 0xC4,
    /// Create an empty struct.
    NEWSTRUCT0 = 0xC5,
    /// Create a struct of n default values.
    NEWSTRUCT = 0xC6,
    /// Create an empty map.
    NEWMAP = 0xC8,
    /// Number of items in a collection.
    SIZE = 0xCA,
    /// True if a collection contains a key.
    HASKEY = 0xCB,
    /// The keys of a map.
    KEYS = 0xCC,
    /// The values of a map.
    VALUES = 0xCD,
    /// Read an element from a collection.
    PICKITEM = 0xCE,
    /// Append an item to an array.
    APPEND = 0xCF,
    /// Write an element of a collection.
    SETITEM = 0xD0,
    /// Reverse the items of an array in place.
    REVERSEITEMS = 0xD1,
    /// Remove an element from a collection.
    REMOVE = 0xD2,
    /// Remove all elements of a collection.
    CLEARITEMS = 0xD3,
    /// Pop the last element of an array.
    POPITEM = 0xD4,

    // Types
    /// True if the top item is null.
    ISNULL = 0xD8,
    /// True if the top item has the given type.
    ISTYPE = 0xD9,
    /// Convert the top item to the given type.
    CONVERT = 0xDB,
}

/// Operand metadata of an opcode: a dynamic length prefix and/or a fixed
/// operand width, both in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSize {
    /// Size of the length prefix announcing a dynamic operand.
    pub prefix: usize,
    /// Size of a fixed-width operand.
    pub size: usize,
}

impl OperandSize {
    const fn fixed(size: usize) -> Self {
        Self { prefix: 0, size }
    }

    const fn prefixed(prefix: usize) -> Self {
        Self { prefix, size: 0 }
    }
}

impl OpCode {
    /// The raw byte value of this opcode.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Looks up an opcode by its byte value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        ALL_OPCODES.iter().copied().find(|op| op.byte() == byte)
    }

    /// The operand metadata, if this opcode takes an operand.
    pub fn operand_size(self) -> Option<OperandSize> {
        use OpCode::*;
        let info = match self {
            PUSHINT8 | JMP | JMPIF | JMPIFNOT | JMPEQ | JMPNE | JMPGT | JMPGE | JMPLT | JMPLE
            | CALL | ENDTRY | INITSSLOT | LDSFLD | STSFLD | LDLOC | STLOC | LDARG | STARG
            | NEWARRAY_T | ISTYPE | CONVERT => OperandSize::fixed(1),
            PUSHINT16 | CALLT | TRY | INITSLOT => OperandSize::fixed(2),
            PUSHINT32 | PUSHA | JMP_L | JMPIF_L | JMPIFNOT_L | JMPEQ_L | JMPNE_L | JMPGT_L
            | JMPGE_L | JMPLT_L | JMPLE_L | CALL_L | ENDTRY_L | SYSCALL => OperandSize::fixed(4),
            PUSHINT64 | TRY_L => OperandSize::fixed(8),
            PUSHINT128 => OperandSize::fixed(16),
            PUSHINT256 => OperandSize::fixed(32),
            PUSHDATA1 => OperandSize::prefixed(1),
            PUSHDATA2 => OperandSize::prefixed(2),
            PUSHDATA4 => OperandSize::prefixed(4),
            _ => return None,
        };
        Some(info)
    }
}

/// All defined opcodes, in byte order.
pub const ALL_OPCODES: &[OpCode] = &[
    OpCode::PUSHINT8,
    OpCode::PUSHINT16,
    OpCode::PUSHINT32,
    OpCode::PUSHINT64,
    OpCode::PUSHINT128,
    OpCode::PUSHINT256,
    OpCode::PUSHT,
    OpCode::PUSHF,
    OpCode::PUSHA,
    OpCode::PUSHNULL,
    OpCode::PUSHDATA1,
    OpCode::PUSHDATA2,
    OpCode::PUSHDATA4,
    OpCode::PUSHM1,
    OpCode::PUSH0,
    OpCode::PUSH1,
    OpCode::PUSH2,
    OpCode::PUSH3,
    OpCode::PUSH4,
    OpCode::PUSH5,
    OpCode::PUSH6,
    OpCode::PUSH7,
    OpCode::PUSH8,
    OpCode::PUSH9,
    OpCode::PUSH10,
    OpCode::PUSH11,
    OpCode::PUSH12,
    OpCode::PUSH13,
    OpCode::PUSH14,
    OpCode::PUSH15,
    OpCode::PUSH16,
    OpCode::NOP,
    OpCode::JMP,
    OpCode::JMP_L,
    OpCode::JMPIF,
    OpCode::JMPIF_L,
    OpCode::JMPIFNOT,
    OpCode::JMPIFNOT_L,
    OpCode::JMPEQ,
    OpCode::JMPEQ_L,
    OpCode::JMPNE,
    OpCode::JMPNE_L,
    OpCode::JMPGT,
    OpCode::JMPGT_L,
    OpCode::JMPGE,
    OpCode::JMPGE_L,
    OpCode::JMPLT,
    OpCode::JMPLT_L,
    OpCode::JMPLE,
    OpCode::JMPLE_L,
    OpCode::CALL,
    OpCode::CALL_L,
    OpCode::CALLA,
    OpCode::CALLT,
    OpCode::ABORT,
    OpCode::ASSERT,
    OpCode::THROW,
    OpCode::TRY,
    OpCode::TRY_L,
    OpCode::ENDTRY,
    OpCode::ENDTRY_L,
    OpCode::ENDFINALLY,
    OpCode::RET,
    OpCode::SYSCALL,
    OpCode::DEPTH,
    OpCode::DROP,
    OpCode::NIP,
    OpCode::XDROP,
    OpCode::CLEAR,
    OpCode::DUP,
    OpCode::OVER,
    OpCode::PICK,
    OpCode::TUCK,
    OpCode::SWAP,
    OpCode::ROT,
    OpCode::ROLL,
    OpCode::REVERSE3,
    OpCode::REVERSE4,
    OpCode::REVERSEN,
    OpCode::INITSSLOT,
    OpCode::INITSLOT,
    OpCode::LDSFLD0,
    OpCode::LDSFLD1,
    OpCode::LDSFLD2,
    OpCode::LDSFLD3,
    OpCode::LDSFLD4,
    OpCode::LDSFLD5,
    OpCode::LDSFLD6,
    OpCode::LDSFLD,
    OpCode::STSFLD0,
    OpCode::STSFLD1,
    OpCode::STSFLD2,
    OpCode::STSFLD3,
    OpCode::STSFLD4,
    OpCode::STSFLD5,
    OpCode::STSFLD6,
    OpCode::STSFLD,
    OpCode::LDLOC0,
    OpCode::LDLOC1,
    OpCode::LDLOC2,
    OpCode::LDLOC3,
    OpCode::LDLOC4,
    OpCode::LDLOC5,
    OpCode::LDLOC6,
    OpCode::LDLOC,
    OpCode::STLOC0,
    OpCode::STLOC1,
    OpCode::STLOC2,
    OpCode::STLOC3,
    OpCode::STLOC4,
    OpCode::STLOC5,
    OpCode::STLOC6,
    OpCode::STLOC,
    OpCode::LDARG0,
    OpCode::LDARG1,
    OpCode::LDARG2,
    OpCode::LDARG3,
    OpCode::LDARG4,
    OpCode::LDARG5,
    OpCode::LDARG6,
    OpCode::LDARG,
    OpCode::STARG0,
    OpCode::STARG1,
    OpCode::STARG2,
    OpCode::STARG3,
    OpCode::STARG4,
    OpCode::STARG5,
    OpCode::STARG6,
    OpCode::STARG,
    OpCode::NEWBUFFER,
    OpCode::MEMCPY,
    OpCode::CAT,
    OpCode::SUBSTR,
    OpCode::LEFT,
    OpCode::RIGHT,
    OpCode::INVERT,
    OpCode::AND,
    OpCode::OR,
    OpCode::XOR,
    OpCode::EQUAL,
    OpCode::NOTEQUAL,
    OpCode::SIGN,
    OpCode::ABS,
    OpCode::NEGATE,
    OpCode::INC,
    OpCode::DEC,
    OpCode::ADD,
    OpCode::SUB,
    OpCode::MUL,
    OpCode::DIV,
    OpCode::MOD,
    OpCode::POW,
    OpCode::SQRT,
    OpCode::MODMUL,
    OpCode::MODPOW,
    OpCode::SHL,
    OpCode::SHR,
    OpCode::NOT,
    OpCode::BOOLAND,
    OpCode::BOOLOR,
    OpCode::NZ,
    OpCode::NUMEQUAL,
    OpCode::NUMNOTEQUAL,
    OpCode::LT,
    OpCode::LE,
    OpCode::GT,
    OpCode::GE,
    OpCode::MIN,
    OpCode::MAX,
    OpCode::WITHIN,
    OpCode::PACKMAP,
    OpCode::PACKSTRUCT,
    OpCode::PACK,
    OpCode::UNPACK,
    OpCode::NEWARRAY0,
    OpCode::NEWARRAY,
    OpCode::NEWARRAY_T,
    OpCode::NEWSTRUCT0,
    OpCode::NEWSTRUCT,
    OpCode::NEWMAP,
    OpCode::SIZE,
    OpCode::HASKEY,
    OpCode::KEYS,
    OpCode::VALUES,
    OpCode::PICKITEM,
    OpCode::APPEND,
    OpCode::SETITEM,
    OpCode::REVERSEITEMS,
    OpCode::REMOVE,
    OpCode::CLEARITEMS,
    OpCode::POPITEM,
    OpCode::ISNULL,
    OpCode::ISTYPE,
    OpCode::CONVERT,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for op in ALL_OPCODES {
            assert_eq!(OpCode::from_byte(op.byte()), Some(*op));
        }
    }

    #[test]
    fn undefined_bytes_are_none() {
        assert_eq!(OpCode::from_byte(0x06), None);
        assert_eq!(OpCode::from_byte(0x42), None);
        assert_eq!(OpCode::from_byte(0xFF), None);
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::SYSCALL.operand_size(), Some(OperandSize::fixed(4)));
        assert_eq!(OpCode::INITSLOT.operand_size(), Some(OperandSize::fixed(2)));
        assert_eq!(OpCode::TRY.operand_size(), Some(OperandSize::fixed(2)));
        assert_eq!(OpCode::TRY_L.operand_size(), Some(OperandSize::fixed(8)));
        assert_eq!(
            OpCode::PUSHDATA1.operand_size(),
            Some(OperandSize::prefixed(1))
        );
        assert_eq!(OpCode::RET.operand_size(), None);
    }

    #[test]
    fn push_constants_are_contiguous() {
        assert_eq!(OpCode::PUSH0.byte(), 0x10);
        assert_eq!(OpCode::PUSH16.byte(), 0x20);
        assert_eq!(OpCode::PUSH16.byte() - OpCode::PUSH0.byte(), 16);
    }
}
