//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    constants::{Address, MEM_START},
    opcode::Op,
};

/// Linear disassembler over a program image.
///
/// Every word is decoded as an instruction, there is no attempt to
/// separate code from data. Sprites and other data show up as unknown
/// words or as nonsense instructions.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

/// A single decoded word of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    /// Address in memory where the instruction is located.
    pub addr: Address,
    /// The original bytes that were read from the buffer.
    pub bytes: [u8; 2],
    pub op: Op,
}

impl Instr {
    /// Original bytes encoded into a `u16`.
    #[inline(always)]
    pub fn bytecode(&self) -> u16 {
        u16::from_be_bytes(self.bytes)
    }
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Write the whole program as a listing, one instruction per line.
    pub fn write_listing<W: FmtWrite>(self, w: &mut W) -> fmt::Result {
        for instr in self {
            writeln!(
                w,
                "{:04X}: {:04X}  {}",
                instr.addr,
                instr.bytecode(),
                instr.op
            )?;
        }
        Ok(())
    }

    pub fn listing(self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        self.write_listing(&mut buf)?;
        Ok(buf)
    }
}

impl<'a> Iterator for Disassembler<'a> {
    type Item = Instr;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = match self.bytecode.get(self.cursor..) {
            Some([a, b, ..]) => [*a, *b],
            // A trailing odd byte is padded as the high byte of a word.
            Some([a]) => [*a, 0],
            _ => return None,
        };
        let addr = (MEM_START + self.cursor) as Address;
        self.cursor += 2;

        Some(Instr {
            addr,
            bytes,
            op: Op::decode(u16::from_be_bytes(bytes)),
        })
    }
}
