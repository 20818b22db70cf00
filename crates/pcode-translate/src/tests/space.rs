use pcode_sys::sys;
use toy_isa::{CONSTANT_SPACE, RAM_SPACE, REGISTER_SPACE, UNIQUE_SPACE};

use super::toy_session;
use crate::*;

#[test]
pub fn addr_space_type() {
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_IOP),
        AddressSpaceType::PcodeOp
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_CONSTANT),
        AddressSpaceType::Constant
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_PROCESSOR),
        AddressSpaceType::Processor
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_JOIN),
        AddressSpaceType::Join
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_FSPEC),
        AddressSpaceType::FuncCallSpecs
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_INTERNAL),
        AddressSpaceType::Internal
    );
    assert_eq!(
        AddressSpaceType::from(sys::SpaceType::IPTR_SPACEBASE),
        AddressSpaceType::BaseRegister
    );
}

#[test]
#[should_panic(expected = "Unknown address space type")]
fn unknown_addr_space_type() {
    let _ = AddressSpaceType::from(sys::SpaceType::from(7));
}

#[test]
fn spaces_enumerated_on_creation() {
    let session = toy_session();
    let names = session
        .spaces()
        .iter()
        .map(|space| space.name())
        .collect::<Vec<_>>();
    assert_eq!(names, ["const", "ram", "register", "unique"]);
    assert_eq!(session.registry().len(), 4);

    let constant = session.space("const").expect("const space should exist");
    assert!(constant.is_constant());
    assert_eq!(constant.handle(), CONSTANT_SPACE);
    assert_eq!(constant.endianness(), Endianness::Big);
    assert_eq!(
        session.space("unique").map(|space| space.space_type()),
        Some(AddressSpaceType::Internal)
    );
    assert!(session.space("stack").is_none());
}

#[test]
fn resolve_returns_identical_instance() {
    let session = toy_session();
    let first = session.resolve_space(REGISTER_SPACE);
    let second = session.resolve_space(REGISTER_SPACE);
    assert!(first.ptr_eq(&second));
    assert_eq!(first, second);

    let enumerated = session.space("register").expect("register space should exist");
    assert!(enumerated.ptr_eq(&first));
    assert!(session.default_code_space().ptr_eq(&session.resolve_space(RAM_SPACE)));
    assert_ne!(first, session.resolve_space(UNIQUE_SPACE));

    // Repeated sightings do not grow the registry
    assert_eq!(session.registry().len(), 4);
}

#[test]
fn spaces_of_different_sessions_differ() {
    let first = toy_session();
    let second = toy_session();

    let first_ram = first.default_code_space();
    let second_ram = second.default_code_space();
    assert_eq!(first_ram.name(), second_ram.name());
    assert_eq!(first_ram.handle(), second_ram.handle());
    assert_ne!(first_ram, second_ram);
}

#[test]
fn constant_encodes_space() {
    let session = toy_session();
    let constant = Address::new(
        session.resolve_space(CONSTANT_SPACE),
        REGISTER_SPACE.to_constant_offset(),
    );

    let space = constant.space_from_constant(&session);
    assert!(space.ptr_eq(&session.resolve_space(REGISTER_SPACE)));
}

#[test]
#[should_panic(expected = "is not in the constant space")]
fn space_from_non_constant() {
    let session = toy_session();
    let address = Address::new(session.default_code_space(), RAM_SPACE.to_constant_offset());
    address.space_from_constant(&session);
}

#[test]
#[should_panic(expected = "belongs to another session")]
fn space_from_constant_of_other_session() {
    let session = toy_session();
    let other = toy_session();
    let constant = Address::new(
        other.resolve_space(CONSTANT_SPACE),
        RAM_SPACE.to_constant_offset(),
    );
    constant.space_from_constant(&session);
}
