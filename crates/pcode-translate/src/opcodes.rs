//! P-code opcodes. The engine reports opcodes as raw numeric codes ([sys::OpCode]); this module
//! groups them by the kind of data they operate on. [AnalysisOp] opcodes only appear in the
//! output of analysis passes and never in a direct translation of machine code.
use std::borrow::Cow;

use pcode_sys::sys;

/// A p-code opcode. The canonical p-code name (e.g. `INT_ADD`) is available through
/// [OpCode::name] and the [std::fmt::Display] output.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum OpCode {
    /// `COPY`: output = input0
    Copy,

    /// `LOAD`: read from the space encoded in input0 at the offset held by input1.
    Load,

    /// `STORE`: write input2 to the space encoded in input0 at the offset held by input1.
    Store,

    /// `BRANCH`: jump to a fixed location, either an address or a p-code relative offset.
    Branch,

    /// `CBRANCH`: jump to input0 if the boolean input1 is set.
    BranchConditional,

    /// `BRANCHIND`: jump to the offset held by input0.
    BranchIndirect,

    /// `CALL`: a [OpCode::Branch] that analysis treats as a subroutine call.
    Call,

    /// `CALLIND`: a [OpCode::BranchIndirect] that analysis treats as a subroutine call.
    CallIndirect,

    /// `RETURN`: a [OpCode::BranchIndirect] that analysis treats as a subroutine return.
    Return,

    /// `PIECE`: concatenation, input0 forms the most significant part.
    Piece,

    /// `SUBPIECE`: input0 truncated after discarding input1 least significant bytes.
    Subpiece,

    /// `POPCOUNT`
    Popcount,

    /// `LZCOUNT`
    LzCount,

    Bool(BoolOp),

    Int(IntOp),

    Float(FloatOp),

    Pseudo(PseudoOp),

    Analysis(AnalysisOp),

    /// A raw opcode this crate does not know about.
    Unknown(i32),
}

/// Operations on single-bit booleans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum BoolOp {
    Negate,
    And,
    Or,
    Xor,
}

/// Whether an integer operation interprets its inputs as two's complement signed values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IntSign {
    Signed,
    Unsigned,
}

/// Integer operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IntOp {
    Add,

    /// Two's complement negation (`INT_2COMP`).
    Negate,

    Subtract,
    Multiply,
    Divide(IntSign),
    Remainder(IntSign),
    Equal,
    NotEqual,
    LessThan(IntSign),
    LessThanOrEqual(IntSign),

    /// Zero extension when unsigned, sign extension when signed.
    Extension(IntSign),

    /// Overflow of an addition (`INT_CARRY` / `INT_SCARRY`).
    Carry(IntSign),

    /// Signed overflow of a subtraction. The unsigned borrow is `LessThan(IntSign::Unsigned)`.
    Borrow,

    ShiftLeft,
    ShiftRight(IntSign),

    /// Bitwise variants of the boolean operations (`INT_AND`, `INT_NEGATE`, ...).
    Bitwise(BoolOp),
}

/// Floating-point operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum FloatOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    IsNaN,
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    AbsoluteValue,
    SquareRoot,
    IntToFloat,
    FloatToFloat,

    /// Round towards zero and convert to an integer.
    Truncate,

    Ceiling,
    Floor,
    Round,
}

/// Placeholders for behavior p-code cannot express directly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PseudoOp {
    /// A user-defined operation such as a syscall.
    CallOther,

    /// A run-time dependent value from the constant pool of a managed environment.
    ConstantPoolRef,

    /// Object allocation.
    New,
}

/// Operations introduced by analysis passes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum AnalysisOp {
    /// Phi-node
    MultiEqual,
    CopyIndirect,
    PointerAdd,
    PointerSubcomponent,
    Cast,
    Insert,
    Extract,
    SegmentOp,
}

/// Declares the one-to-one mapping between raw codes and [OpCode] values. Both conversion
/// directions are generated from the same table so they cannot drift apart.
macro_rules! opcode_mapping {
    ($($raw:ident => $opcode:expr,)*) => {
        impl From<sys::OpCode> for OpCode {
            fn from(value: sys::OpCode) -> Self {
                $(
                    if value == sys::OpCode::$raw {
                        return $opcode;
                    }
                )*
                OpCode::Unknown(value.repr)
            }
        }

        impl From<OpCode> for sys::OpCode {
            fn from(value: OpCode) -> Self {
                $(
                    if value == $opcode {
                        return sys::OpCode::$raw;
                    }
                )*
                sys::OpCode::CPUI_MAX
            }
        }
    };
}

opcode_mapping! {
    CPUI_COPY => OpCode::Copy,
    CPUI_LOAD => OpCode::Load,
    CPUI_STORE => OpCode::Store,
    CPUI_BRANCH => OpCode::Branch,
    CPUI_CBRANCH => OpCode::BranchConditional,
    CPUI_BRANCHIND => OpCode::BranchIndirect,
    CPUI_CALL => OpCode::Call,
    CPUI_CALLIND => OpCode::CallIndirect,
    CPUI_CALLOTHER => OpCode::Pseudo(PseudoOp::CallOther),
    CPUI_RETURN => OpCode::Return,
    CPUI_INT_EQUAL => OpCode::Int(IntOp::Equal),
    CPUI_INT_NOTEQUAL => OpCode::Int(IntOp::NotEqual),
    CPUI_INT_SLESS => OpCode::Int(IntOp::LessThan(IntSign::Signed)),
    CPUI_INT_SLESSEQUAL => OpCode::Int(IntOp::LessThanOrEqual(IntSign::Signed)),
    CPUI_INT_LESS => OpCode::Int(IntOp::LessThan(IntSign::Unsigned)),
    CPUI_INT_LESSEQUAL => OpCode::Int(IntOp::LessThanOrEqual(IntSign::Unsigned)),
    CPUI_INT_ZEXT => OpCode::Int(IntOp::Extension(IntSign::Unsigned)),
    CPUI_INT_SEXT => OpCode::Int(IntOp::Extension(IntSign::Signed)),
    CPUI_INT_ADD => OpCode::Int(IntOp::Add),
    CPUI_INT_SUB => OpCode::Int(IntOp::Subtract),
    CPUI_INT_CARRY => OpCode::Int(IntOp::Carry(IntSign::Unsigned)),
    CPUI_INT_SCARRY => OpCode::Int(IntOp::Carry(IntSign::Signed)),
    CPUI_INT_SBORROW => OpCode::Int(IntOp::Borrow),
    CPUI_INT_2COMP => OpCode::Int(IntOp::Negate),
    CPUI_INT_NEGATE => OpCode::Int(IntOp::Bitwise(BoolOp::Negate)),
    CPUI_INT_XOR => OpCode::Int(IntOp::Bitwise(BoolOp::Xor)),
    CPUI_INT_AND => OpCode::Int(IntOp::Bitwise(BoolOp::And)),
    CPUI_INT_OR => OpCode::Int(IntOp::Bitwise(BoolOp::Or)),
    CPUI_INT_LEFT => OpCode::Int(IntOp::ShiftLeft),
    CPUI_INT_RIGHT => OpCode::Int(IntOp::ShiftRight(IntSign::Unsigned)),
    CPUI_INT_SRIGHT => OpCode::Int(IntOp::ShiftRight(IntSign::Signed)),
    CPUI_INT_MULT => OpCode::Int(IntOp::Multiply),
    CPUI_INT_DIV => OpCode::Int(IntOp::Divide(IntSign::Unsigned)),
    CPUI_INT_SDIV => OpCode::Int(IntOp::Divide(IntSign::Signed)),
    CPUI_INT_REM => OpCode::Int(IntOp::Remainder(IntSign::Unsigned)),
    CPUI_INT_SREM => OpCode::Int(IntOp::Remainder(IntSign::Signed)),
    CPUI_BOOL_NEGATE => OpCode::Bool(BoolOp::Negate),
    CPUI_BOOL_XOR => OpCode::Bool(BoolOp::Xor),
    CPUI_BOOL_AND => OpCode::Bool(BoolOp::And),
    CPUI_BOOL_OR => OpCode::Bool(BoolOp::Or),
    CPUI_FLOAT_EQUAL => OpCode::Float(FloatOp::Equal),
    CPUI_FLOAT_NOTEQUAL => OpCode::Float(FloatOp::NotEqual),
    CPUI_FLOAT_LESS => OpCode::Float(FloatOp::LessThan),
    CPUI_FLOAT_LESSEQUAL => OpCode::Float(FloatOp::LessThanOrEqual),
    CPUI_FLOAT_NAN => OpCode::Float(FloatOp::IsNaN),
    CPUI_FLOAT_ADD => OpCode::Float(FloatOp::Add),
    CPUI_FLOAT_DIV => OpCode::Float(FloatOp::Divide),
    CPUI_FLOAT_MULT => OpCode::Float(FloatOp::Multiply),
    CPUI_FLOAT_SUB => OpCode::Float(FloatOp::Subtract),
    CPUI_FLOAT_NEG => OpCode::Float(FloatOp::Negate),
    CPUI_FLOAT_ABS => OpCode::Float(FloatOp::AbsoluteValue),
    CPUI_FLOAT_SQRT => OpCode::Float(FloatOp::SquareRoot),
    CPUI_FLOAT_INT2FLOAT => OpCode::Float(FloatOp::IntToFloat),
    CPUI_FLOAT_FLOAT2FLOAT => OpCode::Float(FloatOp::FloatToFloat),
    CPUI_FLOAT_TRUNC => OpCode::Float(FloatOp::Truncate),
    CPUI_FLOAT_CEIL => OpCode::Float(FloatOp::Ceiling),
    CPUI_FLOAT_FLOOR => OpCode::Float(FloatOp::Floor),
    CPUI_FLOAT_ROUND => OpCode::Float(FloatOp::Round),
    CPUI_MULTIEQUAL => OpCode::Analysis(AnalysisOp::MultiEqual),
    CPUI_INDIRECT => OpCode::Analysis(AnalysisOp::CopyIndirect),
    CPUI_PIECE => OpCode::Piece,
    CPUI_SUBPIECE => OpCode::Subpiece,
    CPUI_CAST => OpCode::Analysis(AnalysisOp::Cast),
    CPUI_PTRADD => OpCode::Analysis(AnalysisOp::PointerAdd),
    CPUI_PTRSUB => OpCode::Analysis(AnalysisOp::PointerSubcomponent),
    CPUI_SEGMENTOP => OpCode::Analysis(AnalysisOp::SegmentOp),
    CPUI_CPOOLREF => OpCode::Pseudo(PseudoOp::ConstantPoolRef),
    CPUI_NEW => OpCode::Pseudo(PseudoOp::New),
    CPUI_INSERT => OpCode::Analysis(AnalysisOp::Insert),
    CPUI_EXTRACT => OpCode::Analysis(AnalysisOp::Extract),
    CPUI_POPCOUNT => OpCode::Popcount,
    CPUI_LZCOUNT => OpCode::LzCount,
}

impl OpCode {
    /// The canonical p-code name of this opcode, e.g. `INT_ADD` for `Int(IntOp::Add)`. Unknown
    /// opcodes are named after their raw value.
    pub fn name(&self) -> Cow<'static, str> {
        if let OpCode::Unknown(repr) = self {
            return Cow::Owned(format!("UNKNOWN({repr})"));
        }

        let code = sys::OpCode::from(*self);
        code.name()
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Owned(format!("UNKNOWN({repr})", repr = code.repr)))
    }

    /// Whether this opcode transfers control.
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            OpCode::Branch
                | OpCode::BranchConditional
                | OpCode::BranchIndirect
                | OpCode::Call
                | OpCode::CallIndirect
                | OpCode::Return
        )
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
