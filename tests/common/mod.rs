#![allow(dead_code)]

use assert_fs::prelude::*;
use pcode_translate::Session;
use toy_isa::{ToyContext, ToyEngine, TOY_LANGUAGE_MAGIC};

/// Load the toy language from a language file, the way a session for a real engine is built.
pub fn toy_session() -> Session<ToyContext> {
    let temp = assert_fs::TempDir::new().expect("failed to create temp dir");
    let language = temp.child("toy.sla");
    language
        .write_binary(TOY_LANGUAGE_MAGIC)
        .expect("failed to write language file");

    Session::builder()
        .context_default("mode", 0)
        .language(language.path())
        .expect("language path should be valid")
        .build(&ToyEngine::new())
        .expect("failed to build session")
}

/// Opcodes of the toy instructions that decode successfully
pub const VALID_OPCODES: &[u8] = &[
    0x00, 0x10, 0x11, 0x12, 0x13, 0x20, 0x21, 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37,
    0x38,
];

pub fn nop() -> Vec<u8> {
    vec![0x00]
}

pub fn add(rd: u8, ra: u8, rb: u8) -> Vec<u8> {
    vec![0x10, rd, ra, rb]
}

pub fn mov(rd: u8, immediate: u8) -> Vec<u8> {
    vec![0x11, rd, immediate]
}

pub fn load(rd: u8, ra: u8) -> Vec<u8> {
    vec![0x20, rd, ra]
}

/// Delayed branch followed by its delay slot
pub fn branch_delayed(relative: i8, delay_slot: &[u8]) -> Vec<u8> {
    assert_eq!(delay_slot.len(), 4, "delay slot must be 4 bytes");
    let mut code = vec![0x31, relative as u8];
    code.extend_from_slice(delay_slot);
    code
}
