//! Structured instruction decoding.
//!
//! Each fetched 16-bit word is decoded once into an [`Op`], with its
//! operands already extracted. The interpreter and the disassembler both
//! work on this representation.
use std::fmt::{self, Formatter};

use crate::constants::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Carry flag is not set.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    ///
    /// Store the value of register VY in register VX.
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// ADDs VX to VY, and stores the result in VX.
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// Subtracts VY from VX, and stores the result in VX.
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx)
    ///
    /// VF is set to the least-significant bit of Vx, then Vx is shifted right by 1.
    /// VY is unused.
    ShiftRight { vx: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx)
    ///
    /// VF is set to the most-significant bit of Vx, then Vx is shifted left by 1.
    /// VY is unused.
    ShiftLeft { vx: u8 },
    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },

    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    ///
    /// Set register VX to the result of bitwise AND between a random number and NN.
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw an `n` row sprite located at address `I` to the display buffer.
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Key { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotKey { vx: u8 },

    // ------------------------------------------------------------------------
    // Misc
    /// Fx07 (LD Vx, DT)
    Load_Vx_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    ///
    /// Wait for a key press, store the value of the key in Vx.
    Load_Vx_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Load_Delay_Vx { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Load_Sound_Vx { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address_Vx { vx: u8 },
    /// Fx29 (LD F, Vx)
    ///
    /// Point `I` to the font glyph of the digit in Vx.
    Load_Font_Vx { vx: u8 },
    /// Fx33 (LD B, Vx)
    ///
    /// Store the binary-coded decimal representation of Vx
    /// in the memory locations I, I+1, and I+2.
    Store_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },

    /// Any word that is not a known instruction.
    ///
    /// Executed as a no-op. Programs commonly contain data and padding
    /// that is never meant to be executed.
    Unknown { code: u16 },
}

impl Op {
    /// Decode a big-endian instruction word.
    pub fn decode(code: u16) -> Self {
        let op = (code >> 12) as u8; // 0xF000
        let vx = ((code >> 8) & 0xF) as u8; // 0x0F00
        let vy = ((code >> 4) & 0xF) as u8; // 0x00F0
        let n = (code & 0xF) as u8; // 0x000F
        let nn = (code & 0xFF) as u8; // 0x00FF
        let address = code & 0xFFF; // 0x0FFF

        match op {
            0x0 => match code {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::Return,
                _ => Self::Unknown { code },
            },
            0x1 => Self::Jump { address },
            0x2 => Self::Call { address },
            0x3 => Self::Skip_Eq_Byte { vx, nn },
            0x4 => Self::Skip_NotEq_Byte { vx, nn },
            0x5 if n == 0 => Self::Skip_Eq { vx, vy },
            0x6 => Self::Load_Byte { vx, nn },
            0x7 => Self::Add_Byte { vx, nn },
            // Arithmetic instructions identified by n
            0x8 => match n {
                0x0 => Self::Load_Vx_Vy { vx, vy },
                0x1 => Self::Or_Vx_Vy { vx, vy },
                0x2 => Self::And_Vx_Vy { vx, vy },
                0x3 => Self::Xor_Vx_Vy { vx, vy },
                0x4 => Self::Add_Vx_Vy { vx, vy },
                0x5 => Self::Sub_Vx_Vy { vx, vy },
                0x6 => Self::ShiftRight { vx },
                0x7 => Self::SubReverse_Vx_Vy { vx, vy },
                0xE => Self::ShiftLeft { vx },
                _ => Self::Unknown { code },
            },
            0x9 if n == 0 => Self::Skip_NotEq { vx, vy },
            0xA => Self::Load_Address { address },
            0xB => Self::Jump_V0 { address },
            0xC => Self::Random { vx, nn },
            0xD => Self::Draw { vx, vy, n },
            // Miscellaneous instructions identified by nn
            0xE => match nn {
                0x9E => Self::Skip_Key { vx },
                0xA1 => Self::Skip_NotKey { vx },
                _ => Self::Unknown { code },
            },
            0xF => match nn {
                0x07 => Self::Load_Vx_Delay { vx },
                0x0A => Self::Load_Vx_Key { vx },
                0x15 => Self::Load_Delay_Vx { vx },
                0x18 => Self::Load_Sound_Vx { vx },
                0x1E => Self::Add_Address_Vx { vx },
                0x29 => Self::Load_Font_Vx { vx },
                0x33 => Self::Store_Bcd { vx },
                0x55 => Self::Store_Registers { vx },
                0x65 => Self::Load_Registers { vx },
                _ => Self::Unknown { code },
            },
            _ => Self::Unknown { code },
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Op::ClearScreen => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Op::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Op::Skip_Eq_Byte { vx, nn } => write!(f, "SE v{vx:X}, {nn}"),
            Op::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE v{vx:X}, {nn}"),
            Op::Skip_Eq { vx, vy } => write!(f, "SE v{vx:X}, v{vy:X}"),
            Op::Load_Byte { vx, nn } => write!(f, "LD v{vx:X}, {nn}"),
            Op::Add_Byte { vx, nn } => write!(f, "ADD v{vx:X}, {nn}"),
            // ------
            Op::Load_Vx_Vy { vx, vy } => write!(f, "LD v{vx:X}, v{vy:X}"),
            Op::Or_Vx_Vy { vx, vy } => write!(f, "OR v{vx:X}, v{vy:X}"),
            Op::And_Vx_Vy { vx, vy } => write!(f, "AND v{vx:X}, v{vy:X}"),
            Op::Xor_Vx_Vy { vx, vy } => write!(f, "XOR v{vx:X}, v{vy:X}"),
            Op::Add_Vx_Vy { vx, vy } => write!(f, "ADD v{vx:X}, v{vy:X}"),
            Op::Sub_Vx_Vy { vx, vy } => write!(f, "SUB v{vx:X}, v{vy:X}"),
            Op::ShiftRight { vx } => write!(f, "SHR v{vx:X}"),
            Op::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN v{vx:X}, v{vy:X}"),
            Op::ShiftLeft { vx } => write!(f, "SHL v{vx:X}"),
            Op::Skip_NotEq { vx, vy } => write!(f, "SNE v{vx:X}, v{vy:X}"),
            // ------
            Op::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Op::Jump_V0 { address } => write!(f, "JP v0, 0x{address:03X}"),
            Op::Random { vx, nn } => write!(f, "RND v{vx:X}, {nn}"),
            Op::Draw { vx, vy, n } => write!(f, "DRW v{vx:X}, v{vy:X}, {n}"),
            // ------
            Op::Skip_Key { vx } => write!(f, "SKP v{vx:X}"),
            Op::Skip_NotKey { vx } => write!(f, "SKNP v{vx:X}"),
            Op::Load_Vx_Delay { vx } => write!(f, "LD v{vx:X}, DT"),
            Op::Load_Vx_Key { vx } => write!(f, "LD v{vx:X}, K"),
            Op::Load_Delay_Vx { vx } => write!(f, "LD DT, v{vx:X}"),
            Op::Load_Sound_Vx { vx } => write!(f, "LD ST, v{vx:X}"),
            Op::Add_Address_Vx { vx } => write!(f, "ADD I, v{vx:X}"),
            Op::Load_Font_Vx { vx } => write!(f, "LD F, v{vx:X}"),
            Op::Store_Bcd { vx } => write!(f, "LD B, v{vx:X}"),
            Op::Store_Registers { vx } => write!(f, "LD [I], v{vx:X}"),
            Op::Load_Registers { vx } => write!(f, "LD v{vx:X}, [I]"),
            Op::Unknown { code } => write!(f, "0x{code:04X}"),
        }
    }
}
