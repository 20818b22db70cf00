//! Code tables and raw decode structures. The numeric values match the ones used by the SLEIGH
//! engine headers (`opcodes.hh`, `space.hh`) so that a binding can pass them through unchanged.

/// Declares a transparent `i32` code type with named values, mirroring the shape of a shared
/// C++ enum: unknown values are representable and can be matched through `repr`.
macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name {
            pub repr: i32,
        }

        impl $name {
            $(
                $(#[$variant_meta])*
                pub const $variant: Self = Self { repr: $value };
            )*

            /// The name of this code as it appears in the engine headers, if it is a known code.
            pub const fn symbol(self) -> Option<&'static str> {
                match self.repr {
                    $($value => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl From<i32> for $name {
            fn from(repr: i32) -> Self {
                Self { repr }
            }
        }
    };
}

code_table! {
    /// Address space type
    SpaceType {
        /// Special space to represent constants
        IPTR_CONSTANT = 0,
        /// Normal spaces modelled by processor
        IPTR_PROCESSOR = 1,
        /// addresses = offsets off of base register
        IPTR_SPACEBASE = 2,
        /// Internally managed temporary space
        IPTR_INTERNAL = 3,
        /// Special internal FuncCallSpecs reference
        IPTR_FSPEC = 4,
        /// Special internal PcodeOp reference
        IPTR_IOP = 5,
        /// Special virtual space to represent split variables
        IPTR_JOIN = 6,
    }
}

code_table! {
    /// Classification of a failed decode
    ErrorType {
        /// The decode completed without error
        ERROR_TYPE_NOERROR = 0,
        /// The instruction was identified but has no p-code semantics
        ERROR_TYPE_UNIMPL = 1,
        /// The bytes do not match any instruction
        ERROR_TYPE_BADDATA = 2,
    }
}

code_table! {
    /// P-code operation code
    OpCode {
        /// Copy one operand to another
        CPUI_COPY = 1,
        /// Load from a pointer into a specified address space
        CPUI_LOAD = 2,
        /// Store at a pointer into a specified address space
        CPUI_STORE = 3,

        /// Always branch
        CPUI_BRANCH = 4,
        /// Conditional branch
        CPUI_CBRANCH = 5,
        /// Indirect branch (jumptable)
        CPUI_BRANCHIND = 6,

        /// Call to an absolute address
        CPUI_CALL = 7,
        /// Call through an indirect address
        CPUI_CALLIND = 8,
        /// User-defined operation
        CPUI_CALLOTHER = 9,
        /// Return from subroutine
        CPUI_RETURN = 10,

        // Integer/bit operations
        /// Integer comparison, equality (==)
        CPUI_INT_EQUAL = 11,
        /// Integer comparison, in-equality (!=)
        CPUI_INT_NOTEQUAL = 12,
        /// Integer comparison, signed less-than (<)
        CPUI_INT_SLESS = 13,
        /// Integer comparison, signed less-than-or-equal (<=)
        CPUI_INT_SLESSEQUAL = 14,
        /// Integer comparison, unsigned less-than (<)
        /// This also indicates a borrow on unsigned substraction
        CPUI_INT_LESS = 15,
        /// Integer comparison, unsigned less-than-or-equal (<=)
        CPUI_INT_LESSEQUAL = 16,
        /// Zero extension
        CPUI_INT_ZEXT = 17,
        /// Sign extension
        CPUI_INT_SEXT = 18,
        /// Addition, signed or unsigned (+)
        CPUI_INT_ADD = 19,
        /// Subtraction, signed or unsigned (-)
        CPUI_INT_SUB = 20,
        /// Test for unsigned carry
        CPUI_INT_CARRY = 21,
        /// Test for signed carry
        CPUI_INT_SCARRY = 22,
        /// Test for signed borrow
        CPUI_INT_SBORROW = 23,
        /// Twos complement
        CPUI_INT_2COMP = 24,
        /// Logical/bitwise negation (~)
        CPUI_INT_NEGATE = 25,
        /// Logical/bitwise exclusive-or (^)
        CPUI_INT_XOR = 26,
        /// Logical/bitwise and (&)
        CPUI_INT_AND = 27,
        /// Logical/bitwise or (|)
        CPUI_INT_OR = 28,
        /// Left shift (<<)
        CPUI_INT_LEFT = 29,
        /// Right shift, logical (>>)
        CPUI_INT_RIGHT = 30,
        /// Right shift, arithmetic (>>)
        CPUI_INT_SRIGHT = 31,
        /// Integer multiplication, signed and unsigned (*)
        CPUI_INT_MULT = 32,
        /// Integer division, unsigned (/)
        CPUI_INT_DIV = 33,
        /// Integer division, signed (/)
        CPUI_INT_SDIV = 34,
        /// Remainder/modulo, unsigned (%)
        CPUI_INT_REM = 35,
        /// Remainder/modulo, signed (%)
        CPUI_INT_SREM = 36,

        /// Boolean negate (!)
        CPUI_BOOL_NEGATE = 37,
        /// Boolean exclusive-or (^^)
        CPUI_BOOL_XOR = 38,
        /// Boolean and (&&)
        CPUI_BOOL_AND = 39,
        /// Boolean or (||)
        CPUI_BOOL_OR = 40,

        // Floating point operations
        /// Floating-point comparison, equality (==)
        CPUI_FLOAT_EQUAL = 41,
        /// Floating-point comparison, in-equality (!=)
        CPUI_FLOAT_NOTEQUAL = 42,
        /// Floating-point comparison, less-than (<)
        CPUI_FLOAT_LESS = 43,
        /// Floating-point comparison, less-than-or-equal (<=)
        CPUI_FLOAT_LESSEQUAL = 44,
        // Slot 45 is currently unused
        /// Not-a-number test (NaN)
        CPUI_FLOAT_NAN = 46,

        /// Floating-point addition (+)
        CPUI_FLOAT_ADD = 47,
        /// Floating-point division (/)
        CPUI_FLOAT_DIV = 48,
        /// Floating-point multiplication (*)
        CPUI_FLOAT_MULT = 49,
        /// Floating-point subtraction (-)
        CPUI_FLOAT_SUB = 50,
        /// Floating-point negation (-)
        CPUI_FLOAT_NEG = 51,
        /// Floating-point absolute value (abs)
        CPUI_FLOAT_ABS = 52,
        /// Floating-point square root (sqrt)
        CPUI_FLOAT_SQRT = 53,

        /// Convert an integer to a floating-point
        CPUI_FLOAT_INT2FLOAT = 54,
        /// Convert between different floating-point sizes
        CPUI_FLOAT_FLOAT2FLOAT = 55,
        /// Round towards zero
        CPUI_FLOAT_TRUNC = 56,
        /// Round towards +infinity
        CPUI_FLOAT_CEIL = 57,
        /// Round towards -infinity
        CPUI_FLOAT_FLOOR = 58,
        /// Round towards nearest
        CPUI_FLOAT_ROUND = 59,

        // Internal opcodes for simplification. Not
        // typically generated in a direct translation.

        // Data-flow operations
        /// Phi-node operator
        CPUI_MULTIEQUAL = 60,
        /// Copy with an indirect effect
        CPUI_INDIRECT = 61,
        /// Concatenate
        CPUI_PIECE = 62,
        /// Truncate
        CPUI_SUBPIECE = 63,

        /// Cast from one data-type to another
        CPUI_CAST = 64,
        /// Index into an array ([])
        CPUI_PTRADD = 65,
        /// Drill down to a sub-field  (->)
        CPUI_PTRSUB = 66,
        /// Look-up a \e segmented address
        CPUI_SEGMENTOP = 67,
        /// Recover a value from the \e constant \e pool
        CPUI_CPOOLREF = 68,
        /// Allocate a new object (new)
        CPUI_NEW = 69,
        /// Insert a bit-range
        CPUI_INSERT = 70,
        /// Extract a bit-range
        CPUI_EXTRACT = 71,
        /// Count the 1-bits
        CPUI_POPCOUNT = 72,
        /// Count the leading 0-bits
        CPUI_LZCOUNT = 73,
        /// Value indicating the end of the op-code values
        CPUI_MAX = 74,
    }
}

impl OpCode {
    /// The canonical p-code name of this opcode, e.g. `INT_ADD` for [OpCode::CPUI_INT_ADD].
    pub fn name(self) -> Option<&'static str> {
        self.symbol()
            .and_then(|symbol| symbol.strip_prefix("CPUI_"))
            .filter(|&name| name != "MAX")
    }
}

/// Opaque handle the engine uses to identify an address space. Handles are stable for the
/// lifetime of the engine context that produced them. Besides identifying spaces, a handle may
/// be encoded into the offset of a constant (e.g. the space operand of a `LOAD`).
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceHandle(usize);

impl std::fmt::Debug for SpaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SpaceHandle")
            .field(&format!(
                "{id:#0width$x}",
                id = &self.0,
                width = 2 * std::mem::size_of::<usize>()
            ))
            .finish()
    }
}

impl std::fmt::Display for SpaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:#0width$x}",
            self.0,
            // Each byte is represented by 2 hex characters
            width = 2 * std::mem::size_of::<usize>()
        )
    }
}

impl SpaceHandle {
    /// Construct a new space handle
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Get the raw identifier of this handle. This identifier should be treated as an opaque
    /// value.
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Reinterprets a constant offset as a space handle. Returns `None` if the offset cannot
    /// hold a handle on this platform.
    pub fn from_constant_offset(offset: u64) -> Option<Self> {
        usize::try_from(offset).ok().map(Self)
    }

    /// Encodes this handle as the offset of a constant.
    pub fn to_constant_offset(self) -> u64 {
        self.0 as u64
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawAddress {
    pub space: SpaceHandle,
    pub offset: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawVarnode {
    pub space: SpaceHandle,
    pub offset: u64,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSeqNum {
    pub pc: RawAddress,
    pub uniq: u32,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPcodeOp {
    pub seq: RawSeqNum,
    pub opcode: OpCode,
    pub output: Option<RawVarnode>,
    pub inputs: Vec<RawVarnode>,
}

/// One decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTranslation {
    pub address: RawAddress,
    /// Encoded length of the instruction, excluding delay slots
    pub length: u32,
    /// Number of bytes following the instruction that belong to its delay slots
    pub length_delay: u32,
    pub asm_mnem: String,
    pub asm_body: String,
    pub ops: Vec<RawPcodeOp>,
}

/// Decode failure. When `error_type` is [ErrorType::ERROR_TYPE_NOERROR] the remaining fields
/// carry no meaning. `instruction_length` is only meaningful for
/// [ErrorType::ERROR_TYPE_UNIMPL].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawError {
    pub error_type: ErrorType,
    pub explain: String,
    pub address: RawAddress,
    pub instruction_length: u32,
}

impl Default for RawError {
    fn default() -> Self {
        Self {
            error_type: ErrorType::ERROR_TYPE_NOERROR,
            explain: String::new(),
            address: RawAddress::default(),
            instruction_length: 0,
        }
    }
}

/// Result of a single decode call. If the error is set, decoding stopped at the failing
/// instruction and `instructions` holds the instructions decoded before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTranslationResult {
    pub instructions: Vec<RawTranslation>,
    pub error: RawError,
}

/// Parameters of a single decode call.
#[derive(Copy, Clone, Debug)]
pub struct DecodeRequest<'a> {
    /// Code to decode. Its length is the byte limit of the request.
    pub bytes: &'a [u8],

    /// Address of the first byte
    pub base: u64,

    /// Maximum number of instructions to decode, or 0 for no limit
    pub max_instructions: usize,

    /// End decoding after an instruction that terminates a basic block
    pub stop_at_basic_block: bool,

    /// End decoding after an instruction that leaves the block without falling through
    pub stop_at_nonlinear_basic_block: bool,
}
