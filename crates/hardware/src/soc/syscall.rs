//! System Call Emulation.
//!
//! The `syscall` instruction hands its arguments to a host-side handler. This module defines:
//! 1. **`SyscallRequest`:** The argument/result record passed to the handler.
//! 2. **`SyscallHandler`:** The hook trait the simulator calls from the Memory stage.
//! 3. **`HostSyscalls`:** The default handler, which prints into a capture buffer.

use std::fmt::Write as _;

use tracing::debug;

/// Print the signed integer in `args[0]`.
pub const SYS_PRINT_INT: u32 = 1;
/// Print the character in `args[0]`.
pub const SYS_PRINT_CHAR: u32 = 2;
/// Print `args[0]` in hex.
pub const SYS_PRINT_HEX: u32 = 3;
/// Return the low 32 bits of the cycle counter.
pub const SYS_CYCLE: u32 = 4;
/// Halt the calling thread.
pub const SYS_EXIT_THREAD: u32 = 5;

/// One system call in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyscallRequest {
    /// Calling core.
    pub core: usize,
    /// Calling thread.
    pub thread: usize,
    /// Call number (from `r1`).
    pub number: u32,
    /// Arguments (from `r2..r4`).
    pub args: [u32; 3],
    /// Value written back to `r1`.
    pub result: u32,
    /// Global cycle of the call.
    pub cycle: u64,
    /// Set by the handler to halt the calling thread at retirement.
    pub exit_thread: bool,
}

/// Host side of the `syscall` instruction.
pub trait SyscallHandler {
    /// Services `req`, filling in `result` and `exit_thread`.
    fn do_system_call(&mut self, req: &mut SyscallRequest);

    /// Appends diagnostic text produced by `printreg`.
    fn write_output(&mut self, _text: &str) {}

    /// Everything printed so far.
    fn output(&self) -> &str {
        ""
    }
}

/// Default handler: console calls print into a capture buffer.
#[derive(Debug, Clone, Default)]
pub struct HostSyscalls {
    output: String,
}

impl HostSyscalls {
    /// Creates a handler with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyscallHandler for HostSyscalls {
    fn do_system_call(&mut self, req: &mut SyscallRequest) {
        let arg = req.args[0];
        match req.number {
            SYS_PRINT_INT => {
                let _ = write!(self.output, "{}", arg as i32);
            }
            SYS_PRINT_CHAR => {
                self.output.push(char::from_u32(arg).unwrap_or('?'));
            }
            SYS_PRINT_HEX => {
                let _ = write!(self.output, "{arg:#x}");
            }
            SYS_CYCLE => req.result = req.cycle as u32,
            SYS_EXIT_THREAD => req.exit_thread = true,
            other => {
                debug!(core = req.core, thread = req.thread, number = other, "unknown syscall");
                req.result = u32::MAX;
            }
        }
    }

    fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn output(&self) -> &str {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_calls_capture_output() {
        let mut h = HostSyscalls::new();
        let mut req = SyscallRequest {
            number: SYS_PRINT_INT,
            args: [(-12i32) as u32, 0, 0],
            ..SyscallRequest::default()
        };
        h.do_system_call(&mut req);
        req.number = SYS_PRINT_CHAR;
        req.args[0] = u32::from('!');
        h.do_system_call(&mut req);
        assert_eq!(h.output(), "-12!");
    }

    #[test]
    fn exit_and_cycle_calls() {
        let mut h = HostSyscalls::new();
        let mut req = SyscallRequest {
            number: SYS_CYCLE,
            cycle: 77,
            ..SyscallRequest::default()
        };
        h.do_system_call(&mut req);
        assert_eq!(req.result, 77);
        req.number = SYS_EXIT_THREAD;
        h.do_system_call(&mut req);
        assert!(req.exit_thread);
    }
}
