//! # Instruction Set Tests
//!
//! Assembler syntax, register aliases, program images and opcode properties.

use pretty_assertions::assert_eq;
use rigel_core::isa::{Instruction, OpClass, Opcode, Program, assemble};
use rstest::rstest;

#[rstest]
#[case("ra", 31)]
#[case("zero", 0)]
#[case("r17", 17)]
#[case("R5", 5)]
fn test_register_aliases(#[case] name: &str, #[case] index: u8) {
    let p = assemble(&format!("jalr {name}\n")).unwrap();
    assert_eq!(p.text[0].rs, index);
}

#[test]
fn test_fetch_outside_text_is_undef() {
    let p = assemble("nop\nhlt\n").unwrap();
    assert_eq!(p.fetch(4).op, Opcode::Hlt);
    assert_eq!(p.fetch(8).op, Opcode::Undef);
    assert_eq!(p.fetch(2).op, Opcode::Undef);
    assert_eq!(p.text_end(), 8);
}

#[test]
fn test_from_instructions_starts_at_zero() {
    let p = Program::from_instructions(vec![
        Instruction::new(Opcode::Addi).rd(1).imm(3),
        Instruction::new(Opcode::Hlt),
    ]);
    assert_eq!(p.entry, 0);
    assert_eq!(p.fetch(0), Instruction::new(Opcode::Addi).rd(1).imm(3));
}

#[test]
fn test_disassembly_reassembles() {
    let source = "add r1, r2, r3\nldw r4, r5, 16\nvadd v1, v2, v3\ntqenq r1, r2, r3, r4\nmfsr r6, 6\nhlt\n";
    let p = assemble(source).unwrap();
    let text: String = p.text.iter().map(|i| format!("{i}\n")).collect();
    assert_eq!(text, source);
    assert_eq!(assemble(&text).unwrap(), p);
}

#[test]
fn test_comments_and_blank_lines() {
    let p = assemble("# header\n\n  addi r1, r0, 1 ; trailing\nend: hlt # done\n").unwrap();
    assert_eq!(p.text.len(), 2);
    assert_eq!(p.label("end"), Some(4));
}

#[test]
fn test_duplicate_label_rejected() {
    let err = assemble("a: nop\na: nop\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.message.contains("duplicate"));
}

#[test]
fn test_misaligned_word_directive_rejected() {
    let err = assemble(".word 0x102 1\n").unwrap_err();
    assert!(err.message.contains("aligned"));
}

#[rstest]
#[case(Opcode::Hlt)]
#[case(Opcode::Sync)]
#[case(Opcode::Syscall)]
fn test_serializing_opcodes(#[case] op: Opcode) {
    assert!(op.is_serializing());
}

#[test]
fn test_opcode_classes() {
    assert_eq!(Opcode::Ldw.class(), OpClass::Load);
    assert_eq!(Opcode::Gstw.class(), OpClass::GlobalStore);
    assert_eq!(Opcode::AtomCas.class(), OpClass::Atomic);
    assert_eq!(Opcode::Vldw.class(), OpClass::VectorMem);
    assert!(Opcode::Jal.links());
    assert!(!Opcode::Jmp.links());
    assert!(!Opcode::Add.is_serializing());
}
