use pcode_sys::sys;

use crate::*;

#[test]
fn type_conversion() {
    let min_opcode = sys::OpCode::CPUI_COPY.repr;
    let max_opcode = sys::OpCode::CPUI_MAX.repr;
    let mut btreeset: std::collections::BTreeSet<_> = Default::default();
    let mut hashset: std::collections::HashSet<_> = Default::default();
    for opcode in min_opcode..max_opcode {
        if opcode == 45 {
            // opcode 45 is unused
            assert_eq!(OpCode::from(sys::OpCode::from(opcode)), OpCode::Unknown(45));
            continue;
        }

        let sys_opcode = sys::OpCode::from(opcode);
        let opcode: OpCode = sys_opcode.into();
        assert_eq!(sys_opcode, opcode.into(), "failed to convert {opcode:?}");

        btreeset.insert(opcode);
        hashset.insert(opcode);
    }

    // Every known raw opcode maps to a distinct value
    assert_eq!(btreeset.len(), (max_opcode - min_opcode - 1) as usize);
    assert_eq!(hashset.len(), btreeset.len());

    assert_eq!(sys::OpCode::from(OpCode::Unknown(0)), sys::OpCode::CPUI_MAX);
    assert_eq!(
        OpCode::from(sys::OpCode::CPUI_MAX),
        OpCode::Unknown(max_opcode)
    );
}

#[test]
fn names() {
    assert_eq!(OpCode::Int(IntOp::Add).name(), "INT_ADD");
    assert_eq!(OpCode::BranchConditional.name(), "CBRANCH");
    assert_eq!(OpCode::Int(IntOp::Negate).name(), "INT_2COMP");
    assert_eq!(OpCode::Int(IntOp::Bitwise(BoolOp::Negate)).name(), "INT_NEGATE");
    assert_eq!(OpCode::Pseudo(PseudoOp::CallOther).name(), "CALLOTHER");
    assert_eq!(OpCode::Float(FloatOp::IsNaN).to_string(), "FLOAT_NAN");
    assert_eq!(OpCode::Unknown(45).name(), "UNKNOWN(45)");
    assert_eq!(OpCode::Unknown(74).name(), "UNKNOWN(74)");
    assert_eq!(OpCode::Unknown(19).name(), "UNKNOWN(19)");
}

#[test]
fn branches() {
    assert!(OpCode::Branch.is_branch());
    assert!(OpCode::Return.is_branch());
    assert!(OpCode::CallIndirect.is_branch());
    assert!(!OpCode::Load.is_branch());
    assert!(!OpCode::Pseudo(PseudoOp::CallOther).is_branch());
}
