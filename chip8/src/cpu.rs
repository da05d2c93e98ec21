//! CPU registers and call stack.
use crate::{constants::*, error::VmFault};

/// Register file of a chip8 interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Program counter pointing to the current position in the bytecode.
    pub pc: Address,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub v: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Addresses are 12 bits, anything
    /// beyond the address space faults once memory is accessed through it.
    pub address: Address,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            v: [0; REGISTER_COUNT],
            address: 0,
        }
    }
}

impl Registers {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline(always)]
    pub fn get(&self, vx: u8) -> u8 {
        self.v[vx as usize & 0xF]
    }

    #[inline(always)]
    pub fn set(&mut self, vx: u8, value: u8) {
        self.v[vx as usize & 0xF] = value;
    }

    /// Write the flag register.
    ///
    /// Called after the destination register is written, so the flag
    /// wins when the destination is VF itself.
    #[inline(always)]
    pub fn set_flag(&mut self, flag: bool) {
        self.v[FLAG_REGISTER] = flag as u8;
    }

    #[inline(always)]
    pub fn flag(&self) -> u8 {
        self.v[FLAG_REGISTER]
    }
}

/// Stack of return pointers used for jumping when a routine call finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    stack: [Address; STACK_SIZE],
    /// Stack pointer, the number of return addresses currently held.
    sp: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Default::default()
    }

    /// Push a return address.
    ///
    /// The `pc` of the calling instruction is only used to report the fault.
    pub fn push(&mut self, return_addr: Address, pc: Address) -> Result<(), VmFault> {
        match self.stack.get_mut(self.sp) {
            Some(slot) => {
                *slot = return_addr;
                self.sp += 1;
                Ok(())
            }
            None => Err(VmFault::StackOverflow { pc }),
        }
    }

    /// Pop the most recent return address.
    pub fn pop(&mut self, pc: Address) -> Result<Address, VmFault> {
        match self.sp.checked_sub(1) {
            Some(sp) => {
                self.sp = sp;
                Ok(self.stack[sp])
            }
            None => Err(VmFault::StackUnderflow { pc }),
        }
    }

    /// Current nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Return addresses from the bottom of the stack to the top.
    pub fn frames(&self) -> &[Address] {
        &self.stack[..self.sp]
    }
}
