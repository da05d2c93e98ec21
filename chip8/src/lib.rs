//! Chip-8 virtual machine core.
//!
//! The machine is stepped one instruction at a time by a host, which is
//! responsible for pacing, rendering, input and sound.
pub mod constants;
mod cpu;
mod disasm;
mod display;
mod error;
mod keypad;
mod memory;
mod opcode;
mod timer;
mod vm;

pub use self::vm::Hz;

/// Version of this implementation, reported by tools.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        cpu::{CallStack, Registers},
        disasm::{Disassembler, Instr},
        display::{Chip8DisplayBuffer, Framebuffer},
        error::{Chip8Error, Chip8Result, LoadError, VmFault},
        keypad::{InvalidKeyCode, KeyCode},
        memory::Memory,
        opcode::Op,
        timer::Timers,
        vm::{Chip8Conf, Chip8Vm, ExecutionStatus},
    };
}
