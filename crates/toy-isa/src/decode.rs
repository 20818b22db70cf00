use pcode_sys::sys::{
    DecodeRequest, ErrorType, OpCode, RawAddress, RawError, RawPcodeOp, RawSeqNum,
    RawTranslation, RawTranslationResult, RawVarnode,
};

use crate::{
    register, CONSTANT_SPACE, DELAY_SLOT_LENGTH, RAM_SPACE, REGISTER_COUNT, REGISTER_SPACE,
    UNIQUE_SPACE,
};

/// How control leaves an instruction
#[derive(Copy, Clone, PartialEq, Eq)]
enum Flow {
    Fallthrough,
    /// Control may or may not fall through (conditional branches and calls)
    Conditional,
    /// Control never falls through
    Unconditional,
}

struct Decoded {
    translation: RawTranslation,
    flow: Flow,
}

pub(crate) fn decode(request: &DecodeRequest<'_>) -> RawTranslationResult {
    let mut result = RawTranslationResult::default();
    let mut offset = 0;
    let mut next_uniq = 0;

    while offset < request.bytes.len() {
        if request.max_instructions > 0 && result.instructions.len() >= request.max_instructions {
            break;
        }

        let decoder = InstructionDecoder {
            bytes: &request.bytes[offset..],
            address: request.base.wrapping_add(offset as u64),
            next_uniq: &mut next_uniq,
            ops: Vec::new(),
        };

        let decoded = match decoder.decode() {
            Ok(decoded) => decoded,
            Err(error) => {
                result.error = error;
                break;
            }
        };

        // Delay slot bytes belong to the branch and are skipped here
        offset += (decoded.translation.length + decoded.translation.length_delay) as usize;
        result.instructions.push(decoded.translation);

        let stop = match decoded.flow {
            Flow::Fallthrough => false,
            Flow::Conditional => request.stop_at_basic_block,
            Flow::Unconditional => {
                request.stop_at_basic_block || request.stop_at_nonlinear_basic_block
            }
        };

        if stop {
            break;
        }
    }

    result
}

fn bad_data(address: u64, explain: impl Into<String>) -> RawError {
    RawError {
        error_type: ErrorType::ERROR_TYPE_BADDATA,
        explain: explain.into(),
        address: ram_address(address),
        instruction_length: 0,
    }
}

fn unimplemented(address: u64, instruction_length: u32) -> RawError {
    RawError {
        error_type: ErrorType::ERROR_TYPE_UNIMPL,
        explain: "instruction has no p-code semantics".to_string(),
        address: ram_address(address),
        instruction_length,
    }
}

fn ram_address(offset: u64) -> RawAddress {
    RawAddress {
        space: RAM_SPACE,
        offset,
    }
}

fn ram(offset: u64) -> RawVarnode {
    RawVarnode {
        space: RAM_SPACE,
        offset,
        size: 4,
    }
}

fn constant(value: u64, size: u32) -> RawVarnode {
    RawVarnode {
        space: CONSTANT_SPACE,
        offset: value,
        size,
    }
}

/// The space operand of `LOAD` and `STORE`
fn ram_space_operand() -> RawVarnode {
    constant(RAM_SPACE.to_constant_offset(), 8)
}

struct InstructionDecoder<'a> {
    bytes: &'a [u8],
    address: u64,
    next_uniq: &'a mut u32,
    ops: Vec<RawPcodeOp>,
}

impl InstructionDecoder<'_> {
    fn byte(&self, index: usize) -> Result<u8, RawError> {
        self.bytes
            .get(index)
            .copied()
            .ok_or_else(|| bad_data(self.address, "instruction is truncated"))
    }

    fn register(&self, index: usize) -> Result<(RawVarnode, String), RawError> {
        let number = self.byte(index)?;
        if number >= REGISTER_COUNT {
            return Err(bad_data(
                self.address,
                format!("invalid register number {number}"),
            ));
        }

        Ok((register(number), format!("r{number}")))
    }

    /// Target of a branch with a relative offset stored at `index`
    fn relative_target(&self, index: usize, length: u64) -> Result<u64, RawError> {
        let relative = self.byte(index)? as i8;
        Ok(self
            .address
            .wrapping_add(length)
            .wrapping_add_signed(relative.into()))
    }

    fn emit(&mut self, opcode: OpCode, output: Option<RawVarnode>, inputs: Vec<RawVarnode>) {
        let seq = RawSeqNum {
            pc: ram_address(self.address),
            uniq: *self.next_uniq,
            order: self.ops.len() as u32,
        };

        *self.next_uniq += 1;
        self.ops.push(RawPcodeOp {
            seq,
            opcode,
            output,
            inputs,
        });
    }

    fn finish(self, length: u32, mnemonic: &str, body: String, flow: Flow) -> Decoded {
        self.finish_delayed(length, 0, mnemonic, body, flow)
    }

    fn finish_delayed(
        self,
        length: u32,
        length_delay: u32,
        mnemonic: &str,
        body: String,
        flow: Flow,
    ) -> Decoded {
        Decoded {
            translation: RawTranslation {
                address: ram_address(self.address),
                length,
                length_delay,
                asm_mnem: mnemonic.to_string(),
                asm_body: body,
                ops: self.ops,
            },
            flow,
        }
    }

    fn decode(mut self) -> Result<Decoded, RawError> {
        let opcode = self.byte(0)?;
        match opcode {
            0x00 => Ok(self.finish(1, "nop", String::new(), Flow::Fallthrough)),
            0x10 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;
                let (rb, b) = self.register(3)?;
                self.emit(OpCode::CPUI_INT_ADD, Some(rd), vec![ra, rb]);
                Ok(self.finish(4, "add", format!("{d}, {a}, {b}"), Flow::Fallthrough))
            }
            0x11 => {
                let (rd, d) = self.register(1)?;
                let immediate = self.byte(2)?;
                self.emit(
                    OpCode::CPUI_COPY,
                    Some(rd),
                    vec![constant(immediate.into(), 4)],
                );
                Ok(self.finish(3, "mov", format!("{d}, #{immediate:#x}"), Flow::Fallthrough))
            }
            0x12 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;
                self.emit(OpCode::CPUI_INT_NEGATE, Some(rd), vec![ra]);
                Ok(self.finish(3, "not", format!("{d}, {a}"), Flow::Fallthrough))
            }
            0x13 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;

                // Big-endian, the low byte is the last one
                let low_byte = RawVarnode {
                    space: REGISTER_SPACE,
                    offset: ra.offset + u64::from(ra.size) - 1,
                    size: 1,
                };
                self.emit(OpCode::CPUI_INT_ZEXT, Some(rd), vec![low_byte]);
                Ok(self.finish(3, "zext", format!("{d}, {a}"), Flow::Fallthrough))
            }
            0x20 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;
                self.emit(OpCode::CPUI_LOAD, Some(rd), vec![ram_space_operand(), ra]);
                Ok(self.finish(3, "ld", format!("{d}, [{a}]"), Flow::Fallthrough))
            }
            0x21 => {
                let (ra, a) = self.register(1)?;
                let (rb, b) = self.register(2)?;
                self.emit(OpCode::CPUI_STORE, None, vec![ram_space_operand(), ra, rb]);
                Ok(self.finish(3, "st", format!("[{a}], {b}"), Flow::Fallthrough))
            }
            0x30 => {
                let target = self.relative_target(1, 2)?;
                self.emit(OpCode::CPUI_BRANCH, None, vec![ram(target)]);
                Ok(self.finish(2, "b", format!("{target:#x}"), Flow::Unconditional))
            }
            0x31 => {
                let target = self.relative_target(1, 2)?;
                if self.bytes.len() < 2 + DELAY_SLOT_LENGTH as usize {
                    return Err(bad_data(self.address, "delay slot is truncated"));
                }

                self.emit(OpCode::CPUI_BRANCH, None, vec![ram(target)]);
                Ok(self.finish_delayed(
                    2,
                    DELAY_SLOT_LENGTH,
                    "bd",
                    format!("{target:#x}"),
                    Flow::Unconditional,
                ))
            }
            0x32 => {
                let (ra, a) = self.register(1)?;
                let target = self.relative_target(2, 3)?;
                let condition = RawVarnode {
                    space: UNIQUE_SPACE,
                    offset: 0x1000,
                    size: 1,
                };
                self.emit(
                    OpCode::CPUI_INT_EQUAL,
                    Some(condition.clone()),
                    vec![ra, constant(0, 4)],
                );
                self.emit(OpCode::CPUI_CBRANCH, None, vec![ram(target), condition]);
                Ok(self.finish(3, "cbz", format!("{a}, {target:#x}"), Flow::Conditional))
            }
            0x33 => {
                let target = u16::from_be_bytes([self.byte(1)?, self.byte(2)?]);
                self.emit(OpCode::CPUI_CALL, None, vec![ram(target.into())]);
                Ok(self.finish(3, "call", format!("{target:#x}"), Flow::Conditional))
            }
            0x34 => {
                let (ra, a) = self.register(1)?;
                self.emit(OpCode::CPUI_BRANCHIND, None, vec![ra]);
                Ok(self.finish(2, "jr", a, Flow::Unconditional))
            }
            0x35 => {
                self.emit(OpCode::CPUI_RETURN, None, vec![register(7)]);
                Ok(self.finish(1, "ret", String::new(), Flow::Unconditional))
            }
            0x36 => {
                let (ra, a) = self.register(1)?;
                self.emit(OpCode::CPUI_CALLIND, None, vec![ra]);
                Ok(self.finish(2, "callr", a, Flow::Conditional))
            }
            0x37 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;
                self.emit(OpCode::CPUI_POPCOUNT, Some(rd), vec![ra]);
                Ok(self.finish(3, "pop", format!("{d}, {a}"), Flow::Fallthrough))
            }
            0x38 => {
                let (rd, d) = self.register(1)?;
                let (ra, a) = self.register(2)?;
                let (rb, b) = self.register(3)?;
                let low_half = |varnode: RawVarnode| RawVarnode {
                    offset: varnode.offset + 2,
                    size: 2,
                    ..varnode
                };
                self.emit(
                    OpCode::CPUI_PIECE,
                    Some(rd),
                    vec![low_half(ra), low_half(rb)],
                );
                Ok(self.finish(4, "pack", format!("{d}, {a}, {b}"), Flow::Fallthrough))
            }
            0xfe => {
                // The operand byte is part of the encoding even without semantics
                self.byte(1)?;
                Err(unimplemented(self.address, 2))
            }
            _ => Err(bad_data(
                self.address,
                format!("no instruction matches byte {opcode:#04x}"),
            )),
        }
    }
}
