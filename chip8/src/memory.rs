//! Addressable main memory.
use log::debug;

use crate::{
    constants::*,
    error::{LoadError, VmFault},
};

/// Flat 4K byte store holding the fontset, the loaded program and working data.
///
/// Every access is bounds checked. Addresses derived from program data
/// that fall outside of the address space produce a fault instead of
/// being wrapped around.
#[derive(Clone)]
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Memory {
    /// Build a memory image with the built-in font and the given program.
    ///
    /// The program is copied verbatim starting at [`MEM_START`].
    pub fn load(bytecode: &[u8]) -> Result<Self, LoadError> {
        if !check_program_size(bytecode) {
            return Err(LoadError::ImageTooLarge {
                size: bytecode.len(),
            });
        }

        let mut ram = Box::new([0; MEM_SIZE]);
        let font_start = FONTSET_START as usize;
        ram[font_start..font_start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
        ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);

        debug!(
            "loaded {} byte program at 0x{:03X}, {} bytes free",
            bytecode.len(),
            MEM_START,
            MAX_PROGRAM_SIZE - bytecode.len()
        );

        Ok(Self { ram })
    }

    #[inline]
    pub fn read_byte(&self, address: usize) -> Result<u8, VmFault> {
        self.ram
            .get(address)
            .copied()
            .ok_or(VmFault::AddressOutOfRange { address })
    }

    /// Fetch two consecutive bytes as a big-endian word.
    #[inline]
    pub fn read_word(&self, address: usize) -> Result<u16, VmFault> {
        let hi = self.read_byte(address)?;
        let lo = self.read_byte(address + 1)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    #[inline]
    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), VmFault> {
        match self.ram.get_mut(address) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(VmFault::AddressOutOfRange { address }),
        }
    }

    /// Borrow `len` bytes starting at `address`.
    ///
    /// Fails when any byte of the range lies outside of memory.
    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8], VmFault> {
        check_range(address, len)?;
        Ok(&self.ram[address..address + len])
    }

    /// Copy `data` into memory starting at `address`.
    ///
    /// Nothing is written when any byte of the range is out of bounds.
    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Result<(), VmFault> {
        check_range(address, data.len())?;
        self.ram[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Full view of memory, for debugging tools.
    pub fn as_slice(&self) -> &[u8] {
        &self.ram[..]
    }
}

/// Checks that the given bytecode fits in the program area of memory.
#[inline]
pub fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= MAX_PROGRAM_SIZE
}

/// Report the first address of the range that falls outside of memory.
#[inline]
fn check_range(address: usize, len: usize) -> Result<(), VmFault> {
    if address + len > MEM_SIZE {
        Err(VmFault::AddressOutOfRange {
            address: address.max(MEM_SIZE),
        })
    } else {
        Ok(())
    }
}
