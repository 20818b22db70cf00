//! Human readable rendering of p-code operations, e.g. `r0 = r1 + r2` or `if (ZF) goto
//! ram[0x1000:8]`.

use pcode_sys::api::TranslationContext;

use crate::location::Varnode;
use crate::opcodes::{BoolOp, FloatOp, IntOp, IntSign, OpCode, PseudoOp};
use crate::pcode::PcodeOp;
use crate::session::Session;
use crate::translation::Translation;

/// How the operation of an opcode is rendered. The output assignment is rendered separately.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpFormat {
    /// `{operator}{input0}`
    Unary(&'static str),

    /// `{input0} {operator} {input1}`
    Binary(&'static str),

    /// `{function}(input0, input1, ...)`
    Function(&'static str),

    /// Control flow and memory access, each with a dedicated form. The value stored by `STORE`
    /// is rendered like any other operand, so registers appear by name rather than as
    /// `register[offset:size]`.
    Special,
}

impl OpFormat {
    /// The format of `opcode`, or `None` if the opcode is rendered generically as
    /// `NAME input0, input1, ...`.
    pub fn of(opcode: OpCode) -> Option<Self> {
        use IntSign::*;
        use OpFormat::*;

        let format = match opcode {
            OpCode::Branch
            | OpCode::BranchIndirect
            | OpCode::Call
            | OpCode::CallIndirect
            | OpCode::BranchConditional
            | OpCode::Load
            | OpCode::Return
            | OpCode::Store => Special,
            OpCode::Copy => Unary(""),
            OpCode::Popcount => Function("popcount"),
            OpCode::Bool(op) => match op {
                BoolOp::Negate => Unary("!"),
                BoolOp::And => Binary("&&"),
                BoolOp::Or => Binary("||"),
                BoolOp::Xor => Binary("^^"),
            },
            OpCode::Int(op) => match op {
                IntOp::Add => Binary("+"),
                IntOp::Negate => Unary("-"),
                IntOp::Subtract => Binary("-"),
                IntOp::Multiply => Binary("*"),
                IntOp::Divide(Unsigned) => Binary("/"),
                IntOp::Divide(Signed) => Binary("s/"),
                IntOp::Remainder(Unsigned) => Binary("%"),
                IntOp::Remainder(Signed) => Binary("s%"),
                IntOp::Equal => Binary("=="),
                IntOp::NotEqual => Binary("!="),
                IntOp::LessThan(Unsigned) => Binary("<"),
                IntOp::LessThan(Signed) => Binary("s<"),
                IntOp::LessThanOrEqual(Unsigned) => Binary("<="),
                IntOp::LessThanOrEqual(Signed) => Binary("s<="),
                IntOp::Extension(Unsigned) => Function("zext"),
                IntOp::Extension(Signed) => Function("sext"),
                IntOp::Carry(Unsigned) => Function("carry"),
                IntOp::Carry(Signed) => Function("scarry"),
                IntOp::Borrow => Function("sborrow"),
                IntOp::ShiftLeft => Binary("<<"),
                IntOp::ShiftRight(Unsigned) => Binary(">>"),
                IntOp::ShiftRight(Signed) => Binary("s>>"),
                IntOp::Bitwise(BoolOp::Negate) => Unary("~"),
                IntOp::Bitwise(BoolOp::And) => Binary("&"),
                IntOp::Bitwise(BoolOp::Or) => Binary("|"),
                IntOp::Bitwise(BoolOp::Xor) => Binary("^"),
            },
            OpCode::Float(op) => match op {
                FloatOp::Equal => Binary("f=="),
                FloatOp::NotEqual => Binary("f!="),
                FloatOp::LessThan => Binary("f<"),
                FloatOp::LessThanOrEqual => Binary("f<="),
                FloatOp::IsNaN => Function("nan"),
                FloatOp::Add => Binary("f+"),
                FloatOp::Subtract => Binary("f-"),
                FloatOp::Multiply => Binary("f*"),
                FloatOp::Divide => Binary("f/"),
                FloatOp::Negate => Unary("f- "),
                FloatOp::AbsoluteValue => Function("abs"),
                FloatOp::SquareRoot => Function("sqrt"),
                FloatOp::IntToFloat => Function("int2float"),
                FloatOp::FloatToFloat => Function("float2float"),
                FloatOp::Truncate => Function("trunc"),
                FloatOp::Ceiling => Function("ceil"),
                FloatOp::Floor => Function("floor"),
                FloatOp::Round => Function("round"),
            },
            OpCode::Pseudo(PseudoOp::ConstantPoolRef) => Function("cpool"),
            OpCode::Pseudo(PseudoOp::New) => Function("newobject"),
            OpCode::Pseudo(PseudoOp::CallOther)
            | OpCode::Piece
            | OpCode::Subpiece
            | OpCode::LzCount
            | OpCode::Analysis(_)
            | OpCode::Unknown(_) => return None,
        };

        Some(format)
    }

    /// Minimum number of inputs required to render an operation in this format
    fn arity(&self, opcode: OpCode) -> usize {
        match self {
            OpFormat::Unary(_) => 1,
            OpFormat::Binary(_) => 2,
            OpFormat::Function(_) => 0,
            OpFormat::Special => match opcode {
                OpCode::Store => 3,
                OpCode::Load | OpCode::BranchConditional => 2,
                _ => 1,
            },
        }
    }
}

/// Renders p-code operations of a session. Register operands are shown by name.
pub struct PcodePrettyPrinter<'a, C> {
    session: &'a Session<C>,
}

impl<'a, C: TranslationContext> PcodePrettyPrinter<'a, C> {
    pub fn new(session: &'a Session<C>) -> Self {
        Self { session }
    }

    /// Render an operand. Constants are shown as hex literals, registers by name and anything
    /// else as `space[offset:size]`.
    pub fn format_varnode(&self, varnode: &Varnode) -> String {
        if varnode.is_constant() {
            return format!("{:#x}", varnode.offset);
        }

        if varnode.space.name() == "register" {
            if let Some(name) = varnode.register_name(self.session) {
                return name;
            }
        }

        varnode.to_string()
    }

    pub fn format(&self, op: &PcodeOp) -> String {
        let expression = match OpFormat::of(op.opcode) {
            Some(format) if op.inputs.len() >= format.arity(op.opcode) => {
                self.format_expression(format, op)
            }
            _ => self.format_generic(op),
        };

        match &op.output {
            Some(output) => format!("{} = {expression}", self.format_varnode(output)),
            None => expression,
        }
    }

    /// Render the assembly of an instruction followed by its operations, one per line. Delay
    /// slot instructions are nested below their branch.
    pub fn format_translation(&self, translation: &Translation) -> String {
        Listing {
            printer: self,
            translation,
            depth: 0,
        }
        .to_string()
    }

    fn format_generic(&self, op: &PcodeOp) -> String {
        if op.inputs.is_empty() {
            return op.opcode.name().into_owned();
        }

        format!("{} {}", op.opcode.name(), self.format_inputs(&op.inputs))
    }

    fn format_inputs(&self, inputs: &[Varnode]) -> String {
        inputs
            .iter()
            .map(|input| self.format_varnode(input))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_expression(&self, format: OpFormat, op: &PcodeOp) -> String {
        let input = |index: usize| self.format_varnode(&op.inputs[index]);
        match format {
            OpFormat::Unary(operator) => format!("{operator}{}", input(0)),
            OpFormat::Binary(operator) => format!("{} {operator} {}", input(0), input(1)),
            OpFormat::Function(function) => {
                format!("{function}({})", self.format_inputs(&op.inputs))
            }
            OpFormat::Special => self.format_special(op),
        }
    }

    fn format_special(&self, op: &PcodeOp) -> String {
        let input = |index: usize| self.format_varnode(&op.inputs[index]);
        let space = |index: usize| op.inputs[index].space_from_constant(self.session);

        match op.opcode {
            OpCode::Branch => format!("goto {}", input(0)),
            OpCode::BranchIndirect => format!("goto [{}]", input(0)),
            OpCode::Call => format!("call {}", input(0)),
            OpCode::CallIndirect => format!("call [{}]", input(0)),
            OpCode::BranchConditional => format!("if ({}) goto {}", input(1), input(0)),
            OpCode::Load => format!("*[{}]{}", space(0), input(1)),
            OpCode::Return => format!("return {}", input(0)),
            OpCode::Store => format!("*[{}]{} = {}", space(0), input(1), input(2)),
            opcode => unreachable!("{opcode} has no special format"),
        }
    }
}

/// An instruction and its operations, with delay slots nested below it
struct Listing<'p, 'a, C> {
    printer: &'p PcodePrettyPrinter<'a, C>,
    translation: &'p Translation,
    depth: usize,
}

impl<C: TranslationContext> std::fmt::Display for Listing<'_, '_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent = "  ".repeat(self.depth);
        writeln!(f, "{indent}{}", self.translation)?;
        for op in &self.translation.ops {
            writeln!(f, "{indent}  {}", self.printer.format(op))?;
        }

        for delay_slot in &self.translation.delay_slots {
            Listing {
                printer: self.printer,
                translation: delay_slot,
                depth: self.depth + 1,
            }
            .fmt(f)?;
        }

        Ok(())
    }
}
