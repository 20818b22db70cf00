use pcode_sys::api::TranslationContext;
use pcode_sys::sys;

use crate::location::{Address, Varnode};
use crate::opcodes::OpCode;
use crate::session::Session;

/// Orders the operations of a translation. Operations emitted for the same instruction share the
/// program counter and are distinguished by `uniq`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeqNum {
    pub pc: Address,

    /// Identifier of the operation, unique within the decode call that produced it
    pub uniq: u32,

    /// Position of the operation within its instruction
    pub order: u32,
}

impl SeqNum {
    pub fn from_raw<C: TranslationContext>(session: &Session<C>, seq: &sys::RawSeqNum) -> Self {
        Self {
            pc: Address::from_raw(session, &seq.pc),
            uniq: seq.uniq,
            order: seq.order,
        }
    }
}

/// A single p-code operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcodeOp {
    pub seq: SeqNum,

    /// The operation this pcode performs. The operation defines the semantics for the inputs and
    /// optional output of this instruction.
    pub opcode: OpCode,

    /// The inputs this pcode operation requires. For example, the [OpCode::Load] operation
    /// requires the first input to be a constant encoding the address space to load from. See
    /// [Varnode::space_from_constant].
    pub inputs: Vec<Varnode>,

    pub output: Option<Varnode>,
}

impl PcodeOp {
    pub fn from_raw<C: TranslationContext>(session: &Session<C>, op: &sys::RawPcodeOp) -> Self {
        Self {
            seq: SeqNum::from_raw(session, &op.seq),
            opcode: op.opcode.into(),
            inputs: op
                .inputs
                .iter()
                .map(|input| Varnode::from_raw(session, input))
                .collect(),
            output: op
                .output
                .as_ref()
                .map(|output| Varnode::from_raw(session, output)),
        }
    }

    /// Offset of the instruction that produced this operation
    pub fn address(&self) -> u64 {
        self.seq.pc.offset
    }
}

/// Renders the operation without consulting the session, e.g. `register[0x0:4] = INT_ADD
/// register[0x4:4], register[0x8:4]`. See [crate::PcodePrettyPrinter] for the readable form.
impl std::fmt::Display for PcodeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(output) = &self.output {
            write!(f, "{output} = ")?;
        }

        write!(f, "{}", self.opcode)?;
        for (i, input) in self.inputs.iter().enumerate() {
            let separator = if i == 0 { " " } else { ", " };
            write!(f, "{separator}{input}")?;
        }

        Ok(())
    }
}
