//! Text Assembler.
//!
//! Turns assembly source into a [`Program`]. The syntax is line oriented:
//! 1. **Instructions:** `mnemonic op, op, ...` with registers `r0..r31` / `v0..v15`
//!    (`ra` aliases `r31`) and decimal, hex or negative immediates.
//! 2. **Labels:** `name:` at the start of a line; a label may be used wherever an
//!    immediate is expected and evaluates to its byte address.
//! 3. **Directives:** `.entry LABEL` sets the start address; `.word ADDR V...` places
//!    initial data words at consecutive addresses starting at `ADDR`.
//! 4. **Comments:** everything after `#` or `;`.

use std::collections::BTreeMap;

use super::instruction::Instruction;
use super::opcode::{Format, Opcode};
use super::program::Program;
use crate::common::constants::{ARCH_SCALAR_REGS, ARCH_VECTOR_REGS, INSTRUCTION_BYTES, LINK_REG};
use crate::common::error::AsmError;

/// One significant source line after comment and label stripping.
struct Line<'a> {
    number: usize,
    body: &'a str,
}

/// Assembles `source` into a program.
///
/// # Errors
///
/// Returns the first diagnostic found, tagged with its 1-based line number.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    let mut labels = BTreeMap::new();
    let mut lines = Vec::new();
    let mut pc: u32 = 0;

    // Pass 1: strip comments, bind labels to addresses.
    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let mut body = raw.split(['#', ';']).next().unwrap_or("").trim();
        while let Some((head, rest)) = split_label(body) {
            if labels.insert(head.to_string(), pc).is_some() {
                return Err(AsmError::new(number, format!("duplicate label `{head}`")));
            }
            body = rest.trim();
        }
        if body.is_empty() {
            continue;
        }
        if !body.starts_with('.') {
            pc += INSTRUCTION_BYTES;
        }
        lines.push(Line { number, body });
    }

    // Pass 2: parse instructions and directives.
    let mut program = Program {
        labels,
        ..Program::default()
    };
    let mut entry = None;
    for line in &lines {
        if let Some(directive) = line.body.strip_prefix('.') {
            parse_directive(directive, line.number, &mut program, &mut entry)?;
        } else {
            let inst = parse_instruction(line.body, line.number, &program.labels)?;
            program.text.push(inst);
        }
    }
    program.entry = entry.unwrap_or(0);
    Ok(program)
}

fn split_label(body: &str) -> Option<(&str, &str)> {
    let (head, rest) = body.split_once(':')?;
    let head = head.trim();
    let valid = !head.is_empty()
        && head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !head.starts_with('.');
    valid.then_some((head, rest))
}

fn parse_directive(
    directive: &str,
    line: usize,
    program: &mut Program,
    entry: &mut Option<u32>,
) -> Result<(), AsmError> {
    let mut words = directive.split(|c: char| c.is_whitespace() || c == ',').filter(|s| !s.is_empty());
    match words.next() {
        Some("entry") => {
            let target = words
                .next()
                .ok_or_else(|| AsmError::new(line, "`.entry` needs a label"))?;
            *entry = Some(parse_imm(target, line, &program.labels)? as u32);
        }
        Some("word") => {
            let base = words
                .next()
                .ok_or_else(|| AsmError::new(line, "`.word` needs an address"))?;
            let base = parse_imm(base, line, &program.labels)? as u32;
            if base % 4 != 0 {
                return Err(AsmError::new(line, format!("`.word` address {base:#x} is not word aligned")));
            }
            for (i, word) in words.enumerate() {
                let value = parse_imm(word, line, &program.labels)? as u32;
                program.data.push((base + 4 * i as u32, value));
            }
        }
        Some(other) => return Err(AsmError::new(line, format!("unknown directive `.{other}`"))),
        None => return Err(AsmError::new(line, "empty directive")),
    }
    Ok(())
}

fn parse_instruction(body: &str, line: usize, labels: &BTreeMap<String, u32>) -> Result<Instruction, AsmError> {
    let (mnemonic, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    let op = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| AsmError::new(line, format!("unknown mnemonic `{mnemonic}`")))?;
    let ops: Vec<&str> = rest
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let expected = match op.format() {
        Format::None => 0,
        Format::J | Format::Jr | Format::Rd | Format::Rs | Format::Imm => 1,
        Format::R2 | Format::RdImm | Format::RsImm | Format::B1 | Format::Addr | Format::VSplat => 2,
        Format::R3 | Format::Ri | Format::B2 | Format::Mem | Format::V3 | Format::Vi | Format::VMem => 3,
        Format::R4 => 4,
    };
    if ops.len() != expected {
        return Err(AsmError::new(
            line,
            format!("`{mnemonic}` takes {expected} operand(s), found {}", ops.len()),
        ));
    }

    let r = |i: usize| scalar_reg(ops[i], line);
    let v = |i: usize| vector_reg(ops[i], line);
    let imm = |i: usize| parse_imm(ops[i], line, labels);
    let inst = Instruction::new(op);
    Ok(match op.format() {
        Format::None => inst,
        Format::R3 => inst.rd(r(0)?).rs(r(1)?).rt(r(2)?),
        Format::R2 => inst.rd(r(0)?).rs(r(1)?),
        Format::Ri | Format::Mem => inst.rd(r(0)?).rs(r(1)?).imm(imm(2)?),
        Format::RdImm => inst.rd(r(0)?).imm(imm(1)?),
        Format::RsImm | Format::Addr => inst.rs(r(0)?).imm(imm(1)?),
        Format::B2 => inst.rs(r(0)?).rt(r(1)?).imm(imm(2)?),
        Format::B1 => inst.rs(r(0)?).imm(imm(1)?),
        Format::J | Format::Imm => inst.imm(imm(0)?),
        Format::Jr | Format::Rs => inst.rs(r(0)?),
        Format::R4 => inst.rd(r(0)?).rs(r(1)?).rt(r(2)?).ru(r(3)?),
        Format::Rd => inst.rd(r(0)?),
        Format::V3 => inst.rd(v(0)?).rs(v(1)?).rt(v(2)?),
        Format::Vi => inst.rd(v(0)?).rs(v(1)?).imm(imm(2)?),
        Format::VSplat => inst.rd(v(0)?).rs(r(1)?),
        Format::VMem => inst.rd(v(0)?).rs(r(1)?).imm(imm(2)?),
    })
}

fn scalar_reg(text: &str, line: usize) -> Result<u8, AsmError> {
    if text.eq_ignore_ascii_case("ra") {
        return Ok(LINK_REG as u8);
    }
    if text.eq_ignore_ascii_case("zero") {
        return Ok(0);
    }
    reg_index(text, 'r', ARCH_SCALAR_REGS)
        .ok_or_else(|| AsmError::new(line, format!("expected scalar register, found `{text}`")))
}

fn vector_reg(text: &str, line: usize) -> Result<u8, AsmError> {
    reg_index(text, 'v', ARCH_VECTOR_REGS)
        .ok_or_else(|| AsmError::new(line, format!("expected vector register, found `{text}`")))
}

fn reg_index(text: &str, prefix: char, limit: usize) -> Option<u8> {
    let digits = text.strip_prefix(prefix).or_else(|| text.strip_prefix(prefix.to_ascii_uppercase()))?;
    let idx: usize = digits.parse().ok()?;
    (idx < limit).then_some(idx as u8)
}

fn parse_imm(text: &str, line: usize, labels: &BTreeMap<String, u32>) -> Result<i32, AsmError> {
    if let Some(addr) = labels.get(text) {
        return Ok(*addr as i32);
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        digits.parse::<i64>()
    }
    .map_err(|_| {
        if text.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            AsmError::new(line, format!("undefined label `{text}`"))
        } else {
            AsmError::new(line, format!("invalid immediate `{text}`"))
        }
    })?;
    let value = if negative { -magnitude } else { magnitude };
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(AsmError::new(line, format!("immediate `{text}` does not fit in 32 bits")));
    }
    // Values above i32::MAX are 32-bit patterns such as 0xffff0000.
    Ok(value as u32 as i32)
}
