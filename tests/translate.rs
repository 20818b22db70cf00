mod common;

use common::*;
use pcode_translate::{OpCode, PcodePrettyPrinter, SleighError, TranslateOptions};

const BASE: u64 = 0x0040_1000;

#[test]
fn invalid_byte() -> pcode_translate::Result<()> {
    let session = toy_session();
    let result = session.translate(&[0xff], BASE, &TranslateOptions::default())?;

    assert!(result.instructions.is_empty());
    match result.error {
        Some(SleighError::BadData { address, .. }) => {
            assert_eq!(address.offset, BASE);
            assert!(address.space.ptr_eq(&session.default_code_space()));
        }
        error => panic!("expected bad data, got {error:?}"),
    }
    Ok(())
}

#[test]
fn format_add() -> pcode_translate::Result<()> {
    let session = toy_session();
    let result = session.translate(&add(0, 1, 2), BASE, &Default::default())?;
    let printer = PcodePrettyPrinter::new(&session);

    let op = &result.instructions[0].ops[0];
    assert_eq!(op.opcode.name(), "INT_ADD");
    assert_eq!(printer.format(op), "r0 = r1 + r2");
    Ok(())
}

#[test]
fn format_load() -> pcode_translate::Result<()> {
    let session = toy_session();
    let result = session.translate(&load(4, 3), BASE, &Default::default())?;
    let printer = PcodePrettyPrinter::new(&session);

    let op = &result.instructions[0].ops[0];
    assert_eq!(op.opcode, OpCode::Load);
    assert_eq!(
        op.inputs[0].space_from_constant(&session),
        session.space("ram").expect("ram space should exist")
    );
    assert_eq!(printer.format(op), "r4 = *[ram]r3");
    Ok(())
}

#[test]
fn delay_slot() -> pcode_translate::Result<()> {
    let session = toy_session();
    let code = branch_delayed(-2, &add(5, 6, 7));
    assert_eq!(code.len(), 6);

    let result = session.translate(&code, BASE, &Default::default())?;
    assert!(result.is_ok());
    assert_eq!(result.instructions.len(), 1);

    let branch = &result.instructions[0];
    assert_eq!(branch.length, 2);
    assert_eq!(branch.delay_slot_length, 4);
    assert_eq!(branch.delay_slots.len(), 1);

    // Decoded from bytes [2:6) at base + 2
    let delay_slot = &branch.delay_slots[0];
    assert_eq!(delay_slot.address.offset, BASE + 2);
    assert_eq!(delay_slot.length, 4);
    assert_eq!(delay_slot.body, "r5, r6, r7");
    Ok(())
}

#[test]
fn single_instruction() -> pcode_translate::Result<()> {
    let session = toy_session();
    let code = [mov(0, 1), nop(), add(1, 0, 0)].concat();
    let result = session.translate(
        &code,
        BASE,
        &TranslateOptions::default().max_instructions(1),
    )?;

    assert!(result.is_ok());
    assert_eq!(result.instructions.len(), 1);
    assert_eq!(result.instructions[0].to_string(), "ram:0x401000: mov r0, #0x1");
    Ok(())
}

#[test]
fn listing() -> pcode_translate::Result<()> {
    let session = toy_session();
    let code = [mov(1, 0x10), load(0, 1), vec![0x35]].concat();
    let result = session.translate(&code, BASE, &Default::default())?;
    let printer = PcodePrettyPrinter::new(&session);

    let listing = result
        .instructions
        .iter()
        .map(|instruction| printer.format_translation(instruction))
        .collect::<String>();

    assert_eq!(
        listing,
        "ram:0x401000: mov r1, #0x10\n  r1 = 0x10\n\
         ram:0x401003: ld r0, [r1]\n  r0 = *[ram]r1\n\
         ram:0x401006: ret\n  return r7\n"
    );
    Ok(())
}
