//! Floating-Point Unit (FPU).
//!
//! Single-precision IEEE 754 arithmetic on values held in scalar registers as raw bits.
//! Results are produced with the host's round-to-nearest-even arithmetic; NaN results are
//! canonicalized so that retired register values are deterministic.

use crate::isa::Opcode;

/// Canonical quiet NaN.
const CANONICAL_NAN: u32 = 0x7FC0_0000;

/// Sign bit of a single-precision value.
const SIGN_BIT: u32 = 0x8000_0000;

/// Floating-Point Unit for scalar and per-lane vector FP operations.
#[derive(Debug)]
pub struct Fpu;

impl Fpu {
    /// Executes a floating-point operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The operation (`Fadd`, `Fmadd`, `Ceqf`, `I2f`, ...).
    /// * `a` - First operand bits.
    /// * `b` - Second operand bits.
    /// * `c` - Accumulator bits for `fmadd` / `fmsub`.
    ///
    /// # Returns
    ///
    /// Result bits; compares return `0` or `1` and `f2i` a saturated integer.
    pub fn execute(op: Opcode, a: u32, b: u32, c: u32) -> u32 {
        let (fa, fb, fc) = (f32::from_bits(a), f32::from_bits(b), f32::from_bits(c));
        match op {
            Opcode::Fadd | Opcode::Vfadd => canonical(fa + fb),
            Opcode::Fsub | Opcode::Vfsub => canonical(fa - fb),
            Opcode::Fmul | Opcode::Vfmul => canonical(fa * fb),
            Opcode::Fmadd => canonical(fa.mul_add(fb, fc)),
            Opcode::Fmsub => canonical(fa.mul_add(fb, -fc)),
            Opcode::Frcp => canonical(fa.recip()),
            Opcode::Frsq => canonical(fa.sqrt().recip()),
            // Sign manipulation is bitwise and never canonicalizes.
            Opcode::Fabs => a & !SIGN_BIT,
            Opcode::Fneg => a ^ SIGN_BIT,
            Opcode::Fmin => canonical(min_num(fa, fb)),
            Opcode::Fmax => canonical(max_num(fa, fb)),
            Opcode::I2f => (a as i32 as f32).to_bits(),
            // `as` saturates and maps NaN to zero.
            Opcode::F2i => fa as i32 as u32,
            Opcode::Ceqf => u32::from(fa == fb),
            Opcode::Cltf => u32::from(fa < fb),
            Opcode::Clef => u32::from(fa <= fb),
            _ => 0,
        }
    }
}

fn canonical(f: f32) -> u32 {
    if f.is_nan() { CANONICAL_NAN } else { f.to_bits() }
}

/// IEEE 754-2008 `minNum`: a single NaN operand is ignored.
fn min_num(a: f32, b: f32) -> f32 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (_, true) => a,
        _ => a.min(b),
    }
}

/// IEEE 754-2008 `maxNum`: a single NaN operand is ignored.
fn max_num(a: f32, b: f32) -> f32 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (_, true) => a,
        _ => a.max(b),
    }
}
