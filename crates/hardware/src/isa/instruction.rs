//! Decoded Instruction Representation.
//!
//! Programs are assembled straight into `Instruction` values; there is no binary encoding.
//! The register fields are interpreted according to the opcode's [`Format`].

use std::fmt;

use super::opcode::{Format, Opcode};

/// A single assembled instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Operation.
    pub op: Opcode,
    /// Destination (or store-data) register.
    pub rd: u8,
    /// First source register.
    pub rs: u8,
    /// Second source register.
    pub rt: u8,
    /// Third source register (`R4` format only).
    pub ru: u8,
    /// Immediate operand or absolute branch target.
    pub imm: i32,
}

impl Instruction {
    /// Creates an instruction with all operand fields zeroed.
    pub const fn new(op: Opcode) -> Self {
        Self {
            op,
            rd: 0,
            rs: 0,
            rt: 0,
            ru: 0,
            imm: 0,
        }
    }

    /// The instruction returned for fetches outside the text segment.
    pub const fn undef() -> Self {
        Self::new(Opcode::Undef)
    }

    /// Sets the destination field.
    #[must_use]
    pub const fn rd(mut self, rd: u8) -> Self {
        self.rd = rd;
        self
    }

    /// Sets the first source field.
    #[must_use]
    pub const fn rs(mut self, rs: u8) -> Self {
        self.rs = rs;
        self
    }

    /// Sets the second source field.
    #[must_use]
    pub const fn rt(mut self, rt: u8) -> Self {
        self.rt = rt;
        self
    }

    /// Sets the third source field.
    #[must_use]
    pub const fn ru(mut self, ru: u8) -> Self {
        self.ru = ru;
        self
    }

    /// Sets the immediate.
    #[must_use]
    pub const fn imm(mut self, imm: i32) -> Self {
        self.imm = imm;
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.op.mnemonic();
        let (rd, rs, rt, ru, imm) = (self.rd, self.rs, self.rt, self.ru, self.imm);
        match self.op.format() {
            Format::None => write!(f, "{m}"),
            Format::R3 => write!(f, "{m} r{rd}, r{rs}, r{rt}"),
            Format::R2 => write!(f, "{m} r{rd}, r{rs}"),
            Format::Ri | Format::Mem => write!(f, "{m} r{rd}, r{rs}, {imm}"),
            Format::RdImm => write!(f, "{m} r{rd}, {imm}"),
            Format::RsImm | Format::Addr => write!(f, "{m} r{rs}, {imm}"),
            Format::B2 => write!(f, "{m} r{rs}, r{rt}, {imm:#x}"),
            Format::B1 => write!(f, "{m} r{rs}, {imm:#x}"),
            Format::J => write!(f, "{m} {imm:#x}"),
            Format::Jr | Format::Rs => write!(f, "{m} r{rs}"),
            Format::R4 => write!(f, "{m} r{rd}, r{rs}, r{rt}, r{ru}"),
            Format::Rd => write!(f, "{m} r{rd}"),
            Format::Imm => write!(f, "{m} {imm}"),
            Format::V3 => write!(f, "{m} v{rd}, v{rs}, v{rt}"),
            Format::Vi => write!(f, "{m} v{rd}, v{rs}, {imm}"),
            Format::VSplat => write!(f, "{m} v{rd}, r{rs}"),
            Format::VMem => write!(f, "{m} v{rd}, r{rs}, {imm}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_follows_format() {
        let i = Instruction::new(Opcode::Add).rd(1).rs(2).rt(3);
        assert_eq!(i.to_string(), "add r1, r2, r3");
        let b = Instruction::new(Opcode::Bnez).rs(4).imm(0x40);
        assert_eq!(b.to_string(), "bnez r4, 0x40");
        let v = Instruction::new(Opcode::Vldw).rd(2).rs(5).imm(16);
        assert_eq!(v.to_string(), "vldw v2, r5, 16");
    }
}
