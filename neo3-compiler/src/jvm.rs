//! The structured representation of compiled JVM classes.
//!
//! Callers hand the compiler fully resolved class structures; no class
//! files are parsed here. Instruction lists interleave labels and line
//! numbers with instructions, mirroring the layout of a decoded method
//! body.

use std::collections::HashMap;

use crate::error::{CompilerError, CompilerResult};

/// Identifies a jump target within a method body.
pub type LabelId = usize;

/// A JVM-level type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    /// Present so that its use can be rejected with a clear diagnostic.
    Float,
    /// Present so that its use can be rejected with a clear diagnostic.
    Double,
    /// A class type, by fully qualified name.
    Object(String),
    /// An array of the element type.
    Array(Box<JvmType>),
}

impl JvmType {
    /// The fully qualified `java.lang.String` type.
    pub fn string() -> Self {
        Self::Object("java.lang.String".to_string())
    }

    /// Whether this is a floating-point type, which contracts reject.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
            || matches!(self, Self::Array(inner) if inner.is_floating_point())
    }

    /// Whether a JVM local of this type occupies two slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    /// The simple name of an object type (the last dot segment).
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) => Some(name.rsplit('.').next().unwrap_or(name)),
            _ => None,
        }
    }
}

/// A reference to a method, as carried by invoke instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmMethodRef {
    pub owner: String,
    pub name: String,
    pub params: Vec<JvmType>,
    pub ret: JvmType,
}

/// A reference to a field, as carried by field instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmFieldRef {
    pub owner: String,
    pub name: String,
    pub ty: JvmType,
}

/// An integer comparison kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

/// One element of a method body: an instruction, a label definition, or
/// a source line marker.
#[derive(Debug, Clone, PartialEq)]
pub enum JvmInsn {
    /// Defines a jump target at this position.
    Label(LabelId),
    /// Records the source line of the following instructions.
    Line(u32),

    /// Pushes an integer constant (ICONST, BIPUSH, SIPUSH, LDC).
    Push(i64),
    /// Pushes a string constant (LDC).
    PushString(String),
    /// Pushes a null reference (ACONST_NULL).
    PushNull,

    /// Loads a local variable or parameter (xLOAD).
    Load(u16),
    /// Stores to a local variable (xSTORE).
    Store(u16),
    /// Increments a local in place (IINC).
    Inc(u16, i32),

    // Arithmetic (xADD .. xXOR).
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Shl,
    Shr,
    And,
    Or,
    Xor,

    /// Unconditional jump (GOTO).
    Goto(LabelId),
    /// Compare two ints and branch (IF_ICMPxx).
    IfCmp(Cmp, LabelId),
    /// Compare an int against zero and branch (IFxx).
    IfZero(Cmp, LabelId),
    /// Branch on reference equality (IF_ACMPEQ / IF_ACMPNE).
    IfRefCmp(bool, LabelId),
    /// Branch on null (IFNULL / IFNONNULL); true = jump when null.
    IfNull(bool, LabelId),
    /// A switch over int cases (TABLESWITCH / LOOKUPSWITCH).
    Switch {
        cases: Vec<(i64, LabelId)>,
        default: LabelId,
    },

    /// Allocates an array (NEWARRAY / ANEWARRAY) of the element type.
    NewArray(JvmType),
    /// Reads an array element (xALOAD).
    ArrayLoad,
    /// Writes an array element (xASTORE).
    ArrayStore,
    /// Pushes an array's length (ARRAYLENGTH).
    ArrayLength,

    /// Calls a static method (INVOKESTATIC).
    InvokeStatic(JvmMethodRef),
    /// Calls a constructor (INVOKESPECIAL).
    InvokeSpecial(JvmMethodRef),
    /// Calls an instance method (INVOKEVIRTUAL).
    InvokeVirtual(JvmMethodRef),

    /// Reads a static field (GETSTATIC).
    GetStatic(JvmFieldRef),
    /// Writes a static field (PUTSTATIC).
    PutStatic(JvmFieldRef),
    /// Reads an instance field (GETFIELD).
    GetField(JvmFieldRef),
    /// Writes an instance field (PUTFIELD).
    PutField(JvmFieldRef),

    /// Allocates an object (NEW), by class name.
    New(String),
    Dup,
    Pop,
    Swap,

    /// Returns without a value (RETURN).
    Return,
    /// Returns the top of the stack (IRETURN / ARETURN / LRETURN).
    ReturnValue,
    /// Throws the top of the stack (ATHROW).
    Throw,

    /// Checked cast (CHECKCAST); a no-op on the NeoVM.
    CheckCast(String),
    /// Type test (INSTANCEOF).
    InstanceOf(JvmType),
}

/// A named local variable or parameter.
///
/// Entries are ordered: the method's parameters first, then the body's
/// locals. `index` is the JVM slot (wide types occupy two).
#[derive(Debug, Clone, PartialEq)]
pub struct JvmLocalVar {
    pub index: u16,
    pub name: String,
    pub ty: JvmType,
}

/// A protected region and its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmTryCatch {
    pub start: LabelId,
    pub end: LabelId,
    pub handler: LabelId,
}

/// A decoded method body.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmMethod {
    pub name: String,
    pub params: Vec<JvmType>,
    pub ret: JvmType,
    pub is_public: bool,
    pub is_static: bool,
    /// All named variables, parameters first. See [`JvmLocalVar`].
    pub local_vars: Vec<JvmLocalVar>,
    pub instructions: Vec<JvmInsn>,
    pub try_catch: Vec<JvmTryCatch>,
}

impl JvmMethod {
    /// The conventional name of an instance constructor.
    pub const CTOR_NAME: &'static str = "<init>";
    /// The conventional name of the class initializer.
    pub const CLASS_CTOR_NAME: &'static str = "<clinit>";

    /// Whether this is an instance constructor.
    pub fn is_ctor(&self) -> bool {
        self.name == Self::CTOR_NAME
    }

    /// Whether this is the class initializer.
    pub fn is_class_ctor(&self) -> bool {
        self.name == Self::CLASS_CTOR_NAME
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmField {
    pub name: String,
    pub ty: JvmType,
    pub is_static: bool,
}

/// A class with its members.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmClass {
    /// Fully qualified name, dot-separated.
    pub name: String,
    /// Fully qualified superclass name; `None` only for `Object`.
    pub super_name: Option<String>,
    pub fields: Vec<JvmField>,
    pub methods: Vec<JvmMethod>,
}

impl JvmClass {
    /// The simple name (last dot segment).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Finds a method by name.
    pub fn method(&self, name: &str) -> Option<&JvmMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// The user classes visible to a compilation, keyed by fully qualified
/// name.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, JvmClass>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class, replacing any previous definition of the same name.
    pub fn add(&mut self, class: JvmClass) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    /// Looks up a class by fully qualified name.
    pub fn get(&self, name: &str) -> CompilerResult<&JvmClass> {
        self.classes
            .get(name)
            .ok_or_else(|| CompilerError::unknown_class(name))
    }

    /// Whether the registry contains the class.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}
