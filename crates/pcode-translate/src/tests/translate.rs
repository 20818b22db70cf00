use toy_isa::{RAM_SPACE, REGISTER_SPACE};

use super::toy_session;
use crate::*;

const BASE: u64 = 0x1000;

fn translate(code: &[u8], options: TranslateOptions) -> Result<TranslationResult> {
    toy_session().translate(code, BASE, &options)
}

fn offsets(result: &TranslationResult) -> Vec<u64> {
    result
        .instructions
        .iter()
        .map(|instruction| instruction.address.offset)
        .collect()
}

#[test]
fn single_instruction() -> Result<()> {
    let session = toy_session();
    let result = session.translate(&[0x10, 0x00, 0x01, 0x02], BASE, &Default::default())?;
    assert!(result.is_ok());
    assert_eq!(result.instructions.len(), 1);

    let instruction = &result.instructions[0];
    assert_eq!(instruction.address.offset, BASE);
    assert!(instruction.address.space.ptr_eq(&session.default_code_space()));
    assert_eq!(instruction.length, 4);
    assert_eq!(instruction.delay_slot_length, 0);
    assert!(instruction.delay_slots.is_empty());
    assert_eq!(instruction.mnemonic, "add");
    assert_eq!(instruction.body, "r0, r1, r2");
    assert_eq!(instruction.end(), BASE + 4);
    assert_eq!(instruction.to_string(), "ram:0x1000: add r0, r1, r2");

    assert_eq!(instruction.ops.len(), 1);
    let op = &instruction.ops[0];
    assert_eq!(op.opcode, OpCode::Int(IntOp::Add));
    assert_eq!(op.address(), BASE);
    assert_eq!(op.seq.order, 0);

    let output = op.output.as_ref().expect("add should have an output");
    assert_eq!(output.space.handle(), REGISTER_SPACE);
    assert_eq!((output.offset, output.size), (0, 4));
    assert_eq!(
        op.inputs
            .iter()
            .map(|input| input.register_name(&session))
            .collect::<Vec<_>>(),
        [Some("r1".to_string()), Some("r2".to_string())]
    );
    Ok(())
}

#[test]
fn spaces_are_shared_across_instructions() -> Result<()> {
    let session = toy_session();
    let result = session.translate(
        &[0x10, 0x00, 0x01, 0x02, 0x12, 0x03, 0x04],
        BASE,
        &Default::default(),
    )?;

    let registers = result
        .ops()
        .flat_map(|op| op.output.iter().chain(op.inputs.iter()))
        .map(|varnode| &varnode.space)
        .collect::<Vec<_>>();
    assert_eq!(registers.len(), 5);

    let register_space = session.space("register").expect("register space should exist");
    for space in registers {
        assert!(space.ptr_eq(&register_space));
    }

    // No spaces besides the enumerated ones were created
    assert_eq!(session.registry().len(), session.spaces().len());
    Ok(())
}

#[test]
fn empty_code() {
    let result = translate(&[], Default::default());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));
}

#[test]
fn bad_data() -> Result<()> {
    let result = translate(&[0xff], Default::default())?;
    assert!(result.instructions.is_empty());

    match result.error {
        Some(SleighError::BadData { explain, address }) => {
            assert_eq!(explain, "no instruction matches byte 0xff");
            assert_eq!(address.offset, BASE);
            assert_eq!(address.space.handle(), RAM_SPACE);
        }
        error => panic!("unexpected error {error:?}"),
    }
    Ok(())
}

#[test]
fn unimplemented_instruction() -> Result<()> {
    let result = translate(&[0x00, 0xfe, 0x01, 0x00], Default::default())?;
    assert_eq!(offsets(&result), [BASE]);

    let error = result.error.expect("decoding should fail");
    assert_eq!(
        error,
        SleighError::Unimplemented {
            explain: "instruction has no p-code semantics".to_string(),
            address: error.address().clone(),
            instruction_length: 2,
        }
    );
    assert_eq!(error.address().offset, BASE + 1);
    assert_eq!(error.explain(), "instruction has no p-code semantics");
    assert_eq!(
        error.to_string(),
        "unimplemented instruction at ram:0x1001: instruction has no p-code semantics"
    );
    Ok(())
}

#[test]
fn error_truncates_instructions() -> Result<()> {
    let code = [0x11, 0x00, 0x05, 0x10, 0x00, 0x01, 0x02, 0xff, 0x00, 0x00];
    let result = translate(&code, Default::default())?;

    assert_eq!(offsets(&result), [BASE, BASE + 3]);
    assert_eq!(
        result.error.as_ref().map(|err| err.address().offset),
        Some(BASE + 7)
    );
    Ok(())
}

#[test]
fn delay_slot() -> Result<()> {
    let code = [0x31, 0x04, 0x10, 0x00, 0x01, 0x02];
    let result = translate(&code, Default::default())?;
    assert!(result.is_ok());
    assert_eq!(result.instructions.len(), 1);

    let branch = &result.instructions[0];
    assert_eq!(branch.mnemonic, "bd");
    assert_eq!(branch.length, 2);
    assert_eq!(branch.delay_slot_length, 4);
    assert_eq!(branch.end(), BASE + 6);
    assert_eq!(branch.delay_slots.len(), 1);

    let delay_slot = &branch.delay_slots[0];
    assert_eq!(delay_slot.address.offset, BASE + 2);
    assert!(delay_slot.address.space.ptr_eq(&branch.address.space));
    assert_eq!(delay_slot.mnemonic, "add");
    assert_eq!(delay_slot.length, 4);
    assert!(delay_slot.delay_slots.is_empty());

    assert_eq!(result.byte_length(), code.len());
    assert_eq!(
        result.ops().map(|op| op.opcode).collect::<Vec<_>>(),
        [OpCode::Branch, OpCode::Int(IntOp::Add)]
    );
    Ok(())
}

#[test]
fn delay_slot_with_several_instructions() -> Result<()> {
    let code = [0x31, 0x10, 0x00, 0x00, 0x00, 0x00, 0x35];
    let result = translate(&code, Default::default())?;

    // The delay slot bytes are not decoded again at the top level
    assert_eq!(offsets(&result), [BASE, BASE + 6]);
    assert_eq!(result.instructions[1].mnemonic, "ret");

    let delay_slots = &result.instructions[0].delay_slots;
    assert_eq!(
        delay_slots
            .iter()
            .map(|instruction| instruction.address.offset)
            .collect::<Vec<_>>(),
        [BASE + 2, BASE + 3, BASE + 4, BASE + 5]
    );
    Ok(())
}

#[test]
fn delay_slot_after_other_instructions() -> Result<()> {
    let code = [0x00, 0x11, 0x01, 0x07, 0x31, 0x00, 0x12, 0x02, 0x01, 0x00];
    let base = 0x8000_0000;
    let result = toy_session().translate(&code, base, &Default::default())?;

    assert_eq!(result.instructions.len(), 3);
    let delay_slots = &result.instructions[2].delay_slots;
    assert_eq!(delay_slots.len(), 2);
    assert_eq!(delay_slots[0].address.offset, base + 6);
    assert_eq!(delay_slots[0].mnemonic, "not");
    assert_eq!(delay_slots[1].address.offset, base + 9);
    assert_eq!(delay_slots[1].mnemonic, "nop");
    Ok(())
}

#[test]
fn truncated_delay_slot() -> Result<()> {
    let result = translate(&[0x31, 0x04, 0x10, 0x00], Default::default())?;
    assert!(result.instructions.is_empty());
    assert_eq!(
        result.error.as_ref().map(SleighError::explain),
        Some("delay slot is truncated")
    );
    Ok(())
}

#[test]
#[should_panic(expected = "failed to decode delay slot")]
fn invalid_delay_slot() {
    let _ = translate(&[0x31, 0x00, 0xff, 0x00, 0x00, 0x00], Default::default());
}

#[test]
fn max_bytes_clamps_code() -> Result<()> {
    let code = [0x11, 0x00, 0x05, 0x11, 0x01, 0x06];

    let result = translate(&code, TranslateOptions::default().max_bytes(3))?;
    assert!(result.is_ok());
    assert_eq!(offsets(&result), [BASE]);

    // The second instruction does not fit
    let result = translate(&code, TranslateOptions::default().max_bytes(4))?;
    assert_eq!(offsets(&result), [BASE]);
    assert_eq!(
        result.error.as_ref().map(SleighError::explain),
        Some("instruction is truncated")
    );

    // Larger than the code
    let result = translate(&code, TranslateOptions::default().max_bytes(100))?;
    assert!(result.is_ok());
    assert_eq!(offsets(&result), [BASE, BASE + 3]);

    // Unlimited
    let result = translate(&code, TranslateOptions::default().max_bytes(0))?;
    assert_eq!(result.byte_length(), code.len());
    Ok(())
}

#[test]
fn max_instructions() -> Result<()> {
    let code = [0x00; 8];
    let result = translate(&code, TranslateOptions::default().max_instructions(1))?;
    assert_eq!(offsets(&result), [BASE]);

    let result = translate(&code, TranslateOptions::default().max_instructions(3))?;
    assert_eq!(offsets(&result), [BASE, BASE + 1, BASE + 2]);

    let result = translate(&code, TranslateOptions::default().max_instructions(0))?;
    assert_eq!(result.instructions.len(), 8);
    Ok(())
}

#[test]
fn stop_at_basic_block() -> Result<()> {
    // nop; cbz r0, +0; nop; nop
    let code = [0x00, 0x32, 0x00, 0x00, 0x00, 0x00];

    let result = translate(&code, TranslateOptions::default().stop_at_basic_block(true))?;
    assert_eq!(offsets(&result), [BASE, BASE + 1]);

    // A conditional branch falls through
    let result = translate(
        &code,
        TranslateOptions::default().stop_at_nonlinear_basic_block(true),
    )?;
    assert_eq!(offsets(&result), [BASE, BASE + 1, BASE + 4, BASE + 5]);
    Ok(())
}

#[test]
fn stop_at_nonlinear_basic_block() -> Result<()> {
    // nop; b +0; nop
    let code = [0x00, 0x30, 0x00, 0x00];
    let result = translate(
        &code,
        TranslateOptions::default().stop_at_nonlinear_basic_block(true),
    )?;
    assert_eq!(offsets(&result), [BASE, BASE + 1]);

    let result = translate(&code, Default::default())?;
    assert_eq!(result.instructions.len(), 3);
    Ok(())
}

#[test]
fn sequence_numbers() -> Result<()> {
    // cbz r1, +0; cbz r2, +0
    let code = [0x32, 0x01, 0x00, 0x32, 0x02, 0x00];
    let result = translate(&code, Default::default())?;
    let seqs = result
        .ops()
        .map(|op| (op.address(), op.seq.uniq, op.seq.order))
        .collect::<Vec<_>>();

    assert_eq!(
        seqs,
        [
            (BASE, 0, 0),
            (BASE, 1, 1),
            (BASE + 3, 2, 0),
            (BASE + 3, 3, 1)
        ]
    );

    let ops = result.ops().collect::<Vec<_>>();
    assert!(ops.windows(2).all(|pair| pair[0].seq < pair[1].seq));
    Ok(())
}
