//! Opcode Table.
//!
//! The instruction set is closed: every opcode is listed once in the table below together with
//! its assembly mnemonic, operand syntax and execution class. It provides:
//! 1. **`Opcode`:** The exhaustive opcode enumeration.
//! 2. **`Format`:** Operand syntax, shared by the assembler and the decoder.
//! 3. **`OpClass`:** Execution class, which selects the functional unit, latency and the
//!    Memory-stage protocol an instruction follows.

use crate::config::LatencyConfig;

/// Operand syntax of an instruction.
///
/// Field names refer to [`Instruction`](super::instruction::Instruction) slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// No operands.
    None,
    /// `rd, rs, rt`
    R3,
    /// `rd, rs`
    R2,
    /// `rd, rs, imm`
    Ri,
    /// `rd, imm`
    RdImm,
    /// `rs, imm`
    RsImm,
    /// `rs, rt, target`
    B2,
    /// `rs, target`
    B1,
    /// `target`
    J,
    /// `rs`
    Jr,
    /// `rd, rs, imm`; `rd` is the data source for stores.
    Mem,
    /// `rs, imm`
    Addr,
    /// `rd, rs, rt, ru`
    R4,
    /// `rd`
    Rd,
    /// `rs`
    Rs,
    /// `imm`
    Imm,
    /// `vd, vs, vt`
    V3,
    /// `vd, vs, imm`
    Vi,
    /// `vd, rs`
    VSplat,
    /// `vd, rs, imm`; `vd` is the data source for stores.
    VMem,
}

/// Execution class of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// Single-cycle integer operation.
    IntAlu,
    /// Shift.
    Shift,
    /// Integer multiply.
    Mul,
    /// Integer compare producing 0/1.
    Compare,
    /// Pipelined floating-point operation.
    Fp,
    /// Long-latency floating-point operation.
    FpLong,
    /// Conditional branch.
    Branch,
    /// Unconditional jump.
    Jump,
    /// Cached load (`ldw`, `ldl`).
    Load,
    /// Cached store (`stw`, `stc`).
    Store,
    /// Uncached global load.
    GlobalLoad,
    /// Uncached global store.
    GlobalStore,
    /// Atomic read-modify-write at the global level.
    Atomic,
    /// Non-binding prefetch.
    Prefetch,
    /// Line invalidate / write-back.
    CacheLine,
    /// Memory barrier.
    Barrier,
    /// Broadcast store.
    Broadcast,
    /// Vector integer operation.
    Vector,
    /// Vector floating-point operation.
    VectorFp,
    /// Vector load / store.
    VectorMem,
    /// Task queue request.
    TaskQueue,
    /// Special-purpose register move.
    Spr,
    /// Thread rendezvous.
    Sync,
    /// Thread halt.
    Halt,
    /// No operation.
    Nop,
    /// Host system call.
    Syscall,
    /// Debug aid (`brk`, `event`, `printreg`).
    Debug,
    /// Undefined instruction.
    Undef,
}

/// Functional unit class arbitrated in Execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuClass {
    /// Integer ALU.
    Alu,
    /// Floating-point unit.
    Fpu,
    /// Shifter.
    Shifter,
    /// Branch unit.
    Branch,
    /// Memory port.
    Mem,
    /// Needs no functional unit.
    None,
}

impl FuClass {
    /// Units that are arbitrated (everything but `None`).
    pub const ARBITRATED: [FuClass; 5] = [
        FuClass::Alu,
        FuClass::Fpu,
        FuClass::Shifter,
        FuClass::Branch,
        FuClass::Mem,
    ];
}

impl OpClass {
    /// Functional unit the class occupies in Execute.
    pub const fn fu_class(self) -> FuClass {
        match self {
            OpClass::IntAlu | OpClass::Mul | OpClass::Compare | OpClass::Vector | OpClass::Spr => {
                FuClass::Alu
            }
            OpClass::Shift => FuClass::Shifter,
            OpClass::Fp | OpClass::FpLong | OpClass::VectorFp => FuClass::Fpu,
            OpClass::Branch | OpClass::Jump => FuClass::Branch,
            OpClass::Load
            | OpClass::Store
            | OpClass::GlobalLoad
            | OpClass::GlobalStore
            | OpClass::Atomic
            | OpClass::Prefetch
            | OpClass::CacheLine
            | OpClass::Barrier
            | OpClass::Broadcast
            | OpClass::VectorMem
            | OpClass::TaskQueue
            | OpClass::Syscall => FuClass::Mem,
            OpClass::Sync | OpClass::Halt | OpClass::Nop | OpClass::Debug | OpClass::Undef => {
                FuClass::None
            }
        }
    }

    /// Result latency of the class under `lat`.
    pub fn latency(self, lat: &LatencyConfig) -> u64 {
        match self {
            OpClass::Shift => lat.shift,
            OpClass::Mul => lat.mul,
            OpClass::Fp | OpClass::VectorFp => lat.fpu,
            OpClass::FpLong => lat.fpu_long,
            OpClass::Branch | OpClass::Jump => lat.branch,
            _ => lat.alu,
        }
    }

    /// Whether the class is executed by the FPU and waits in FPComplete.
    pub const fn is_fp(self) -> bool {
        matches!(self, OpClass::Fp | OpClass::FpLong | OpClass::VectorFp)
    }

    /// Whether the class is a branch or jump.
    pub const fn is_control(self) -> bool {
        matches!(self, OpClass::Branch | OpClass::Jump)
    }

    /// Whether the class is a vector operation.
    pub const fn is_vector(self) -> bool {
        matches!(self, OpClass::Vector | OpClass::VectorFp | OpClass::VectorMem)
    }
}

macro_rules! opcodes {
    ($($(#[$meta:meta])* $variant:ident => ($mn:literal, $fmt:ident, $class:ident),)*) => {
        /// Every instruction the simulated machine understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($(#[$meta])* $variant,)*
        }

        impl Opcode {
            /// Every opcode in table order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// Assembly mnemonic.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mn,)*
                }
            }

            /// Operand syntax.
            pub const fn format(self) -> Format {
                match self {
                    $(Opcode::$variant => Format::$fmt,)*
                }
            }

            /// Execution class.
            pub const fn class(self) -> OpClass {
                match self {
                    $(Opcode::$variant => OpClass::$class,)*
                }
            }
        }
    };
}

opcodes! {
    /// `rd = rs + rt`
    Add => ("add", R3, IntAlu),
    /// `rd = rs - rt`
    Sub => ("sub", R3, IntAlu),
    /// `rd = rs & rt`
    And => ("and", R3, IntAlu),
    /// `rd = rs | rt`
    Or => ("or", R3, IntAlu),
    /// `rd = rs ^ rt`
    Xor => ("xor", R3, IntAlu),
    /// `rd = !(rs | rt)`
    Nor => ("nor", R3, IntAlu),
    /// Low 32 bits of `rs * rt`.
    Mul => ("mul", R3, Mul),
    /// High 32 bits of the signed product.
    Mulh => ("mulh", R3, Mul),
    Addi => ("addi", Ri, IntAlu),
    Subi => ("subi", Ri, IntAlu),
    Andi => ("andi", Ri, IntAlu),
    Ori => ("ori", Ri, IntAlu),
    Xori => ("xori", Ri, IntAlu),
    /// `rd = imm << 16`
    Mvui => ("mvui", RdImm, IntAlu),
    Sll => ("sll", R3, Shift),
    Srl => ("srl", R3, Shift),
    Sra => ("sra", R3, Shift),
    Slli => ("slli", Ri, Shift),
    Srli => ("srli", Ri, Shift),
    Srai => ("srai", Ri, Shift),
    Ceq => ("ceq", R3, Compare),
    Clt => ("clt", R3, Compare),
    Cltu => ("cltu", R3, Compare),
    Cle => ("cle", R3, Compare),
    Cleu => ("cleu", R3, Compare),
    /// Count leading zeros.
    Clz => ("clz", R2, IntAlu),
    Sext8 => ("sext8", R2, IntAlu),
    Sext16 => ("sext16", R2, IntAlu),
    Zext8 => ("zext8", R2, IntAlu),
    Zext16 => ("zext16", R2, IntAlu),
    Fadd => ("fadd", R3, Fp),
    Fsub => ("fsub", R3, Fp),
    Fmul => ("fmul", R3, Fp),
    /// `rd = rs * rt + rd`
    Fmadd => ("fmadd", R3, Fp),
    /// `rd = rs * rt - rd`
    Fmsub => ("fmsub", R3, Fp),
    Frcp => ("frcp", R2, FpLong),
    Frsq => ("frsq", R2, FpLong),
    Fabs => ("fabs", R2, Fp),
    Fneg => ("fneg", R2, Fp),
    Fmin => ("fmin", R3, Fp),
    Fmax => ("fmax", R3, Fp),
    I2f => ("i2f", R2, Fp),
    F2i => ("f2i", R2, Fp),
    Ceqf => ("ceqf", R3, Fp),
    Cltf => ("cltf", R3, Fp),
    Clef => ("clef", R3, Fp),
    Beq => ("beq", B2, Branch),
    Bne => ("bne", B2, Branch),
    Blt => ("blt", B2, Branch),
    Bgt => ("bgt", B2, Branch),
    Ble => ("ble", B2, Branch),
    Bge => ("bge", B2, Branch),
    Beqz => ("beqz", B1, Branch),
    Bnez => ("bnez", B1, Branch),
    Bltz => ("bltz", B1, Branch),
    Bgtz => ("bgtz", B1, Branch),
    Blez => ("blez", B1, Branch),
    Bgez => ("bgez", B1, Branch),
    Jmp => ("jmp", J, Jump),
    /// Jump and link into `r31`.
    Jal => ("jal", J, Jump),
    Jmpr => ("jmpr", Jr, Jump),
    Jalr => ("jalr", Jr, Jump),
    Ldw => ("ldw", Mem, Load),
    Stw => ("stw", Mem, Store),
    /// Load and set a link reservation.
    Ldl => ("ldl", Mem, Load),
    /// Store if the reservation holds; `rd` receives 1 on success.
    Stc => ("stc", Mem, Store),
    Gldw => ("gldw", Mem, GlobalLoad),
    Gstw => ("gstw", Mem, GlobalStore),
    Pldw => ("pldw", Addr, Prefetch),
    LineInv => ("lineinv", Addr, CacheLine),
    LineWb => ("linewb", Addr, CacheLine),
    Mb => ("mb", None, Barrier),
    Bcst => ("bcst", Mem, Broadcast),
    /// Compare `rd` with memory at `rs`; store `rt` on match. `rd` receives the old value.
    AtomCas => ("atomcas", R3, Atomic),
    AtomAdd => ("atomadd", R3, Atomic),
    AtomInc => ("atominc", R2, Atomic),
    AtomDec => ("atomdec", R2, Atomic),
    AtomXchg => ("atomxchg", R3, Atomic),
    AtomMax => ("atommax", R3, Atomic),
    AtomMin => ("atommin", R3, Atomic),
    AtomOr => ("atomor", R3, Atomic),
    AtomAnd => ("atomand", R3, Atomic),
    AtomXor => ("atomxor", R3, Atomic),
    Vadd => ("vadd", V3, Vector),
    Vsub => ("vsub", V3, Vector),
    Vaddi => ("vaddi", Vi, Vector),
    Vfadd => ("vfadd", V3, VectorFp),
    Vfsub => ("vfsub", V3, VectorFp),
    Vfmul => ("vfmul", V3, VectorFp),
    Vsplat => ("vsplat", VSplat, Vector),
    Vldw => ("vldw", VMem, VectorMem),
    Vstw => ("vstw", VMem, VectorMem),
    /// Enqueue one task `(ip, data, begin, end)`.
    TqEnq => ("tqenq", R4, TaskQueue),
    /// Enqueue `ceil(count / stride)` tasks covering `[0, count)`.
    TqLoop => ("tqloop", R4, TaskQueue),
    /// Dequeue into `rd..rd+3`.
    TqDeq => ("tqdeq", Rd, TaskQueue),
    /// Signal that no more work will be enqueued.
    TqEnd => ("tqend", None, TaskQueue),
    Mfsr => ("mfsr", RdImm, Spr),
    Mtsr => ("mtsr", RsImm, Spr),
    Sync => ("sync", None, Sync),
    Hlt => ("hlt", None, Halt),
    Nop => ("nop", None, Nop),
    Syscall => ("syscall", None, Syscall),
    Brk => ("brk", None, Debug),
    Event => ("event", Imm, Debug),
    Printreg => ("printreg", Rs, Debug),
    Undef => ("undef", None, Undef),
}

impl Opcode {
    /// Looks an opcode up by its mnemonic (case-insensitive).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// Whether fetch of the issuing thread pauses behind this instruction until it retires.
    pub const fn is_serializing(self) -> bool {
        matches!(self, Opcode::Hlt | Opcode::Sync | Opcode::Syscall)
    }

    /// Whether the instruction writes the link register.
    pub const fn links(self) -> bool {
        matches!(self, Opcode::Jal | Opcode::Jalr)
    }

    /// Whether the instruction stores its `rd` slot rather than writing it.
    pub const fn stores_rd(self) -> bool {
        matches!(
            self,
            Opcode::Stw | Opcode::Stc | Opcode::Gstw | Opcode::Bcst | Opcode::Vstw
        )
    }
}
