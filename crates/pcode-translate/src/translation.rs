use pcode_sys::api::TranslationContext;
use pcode_sys::sys;

use crate::error::SleighError;
use crate::location::Address;
use crate::pcode::PcodeOp;
use crate::session::Session;

/// One decoded instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    pub address: Address,

    /// Encoded length of the instruction, excluding its delay slots
    pub length: usize,

    /// Number of bytes after the instruction occupied by its delay slots
    pub delay_slot_length: usize,

    pub mnemonic: String,
    pub body: String,
    pub ops: Vec<PcodeOp>,

    /// The instructions in the delay slots, in decode order. Empty when `delay_slot_length` is 0.
    pub delay_slots: Vec<Translation>,
}

impl Translation {
    /// Copies a raw translation. Delay slots are not decoded here, see [Session::translate].
    pub fn from_raw<C: TranslationContext>(
        session: &Session<C>,
        translation: &sys::RawTranslation,
    ) -> Self {
        Self {
            address: Address::from_raw(session, &translation.address),
            length: translation.length as usize,
            delay_slot_length: translation.length_delay as usize,
            mnemonic: translation.asm_mnem.clone(),
            body: translation.asm_body.clone(),
            ops: translation
                .ops
                .iter()
                .map(|op| PcodeOp::from_raw(session, op))
                .collect(),
            delay_slots: Vec::new(),
        }
    }

    /// Offset of the first byte after this instruction and its delay slots
    pub fn end(&self) -> u64 {
        self.address
            .offset
            .wrapping_add((self.length + self.delay_slot_length) as u64)
    }

    pub fn has_delay_slots(&self) -> bool {
        self.delay_slot_length > 0
    }
}

impl std::fmt::Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.address, self.mnemonic)?;
        if !self.body.is_empty() {
            write!(f, " {}", self.body)?;
        }
        Ok(())
    }
}

/// The outcome of one call to [Session::translate]. Decoding stops at the first failure: when
/// `error` is set, `instructions` holds only the instructions decoded before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslationResult {
    pub instructions: Vec<Translation>,
    pub error: Option<SleighError>,
}

impl TranslationResult {
    pub fn from_raw<C: TranslationContext>(
        session: &Session<C>,
        result: &sys::RawTranslationResult,
    ) -> Self {
        Self {
            instructions: result
                .instructions
                .iter()
                .map(|translation| Translation::from_raw(session, translation))
                .collect(),
            error: SleighError::classify(session, &result.error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Number of bytes covered by the decoded instructions, delay slots included
    pub fn byte_length(&self) -> usize {
        self.instructions
            .iter()
            .map(|instruction| instruction.length + instruction.delay_slot_length)
            .sum()
    }

    /// All operations of the decoded instructions in decode order. Operations of delay slot
    /// instructions follow the operations of their branch.
    pub fn ops(&self) -> impl Iterator<Item = &PcodeOp> {
        fn flatten(instruction: &Translation) -> Box<dyn Iterator<Item = &PcodeOp> + '_> {
            Box::new(
                instruction
                    .ops
                    .iter()
                    .chain(instruction.delay_slots.iter().flat_map(flatten)),
            )
        }

        self.instructions.iter().flat_map(flatten)
    }
}

/// Limits applied to a single [Session::translate] call. A limit of 0 means unlimited.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    pub max_instructions: usize,
    pub max_bytes: usize,
    pub stop_at_basic_block: bool,
    pub stop_at_nonlinear_basic_block: bool,
}

impl TranslateOptions {
    pub fn max_instructions(mut self, max_instructions: usize) -> Self {
        self.max_instructions = max_instructions;
        self
    }

    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Stop after an instruction that ends a basic block
    pub fn stop_at_basic_block(mut self, stop: bool) -> Self {
        self.stop_at_basic_block = stop;
        self
    }

    /// Stop after an instruction that never falls through
    pub fn stop_at_nonlinear_basic_block(mut self, stop: bool) -> Self {
        self.stop_at_nonlinear_basic_block = stop;
        self
    }
}
