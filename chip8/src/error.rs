//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

use crate::constants::*;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

/// Umbrella error for everything that can go wrong while loading and running a program.
#[derive(Debug)]
pub enum Chip8Error {
    /// Program image could not be turned into a machine.
    Load(LoadError),
    /// VM fault during interpreter loop.
    Fault(VmFault),
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "load error: {}", err),
            Self::Fault(err) => write!(f, "runtime error: {}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Fault(err) => Some(err),
            Self::Fmt(err) => Some(err),
        }
    }
}

impl From<LoadError> for Chip8Error {
    fn from(err: LoadError) -> Self {
        Chip8Error::Load(err)
    }
}

impl From<VmFault> for Chip8Error {
    fn from(err: VmFault) -> Self {
        Chip8Error::Fault(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

/// Failure to produce a runnable machine from a program image.
///
/// Raised once, at load time. The image should not be run.
#[derive(Debug)]
pub enum LoadError {
    /// Attempt to load a bytecode program that can't fit in memory.
    ImageTooLarge { size: usize },
    /// The program bytes could not be obtained from their source.
    SourceUnavailable(io::Error),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageTooLarge { size } => write!(
                f,
                "program too large for VM memory: {size} bytes, at most {MAX_PROGRAM_SIZE} fit"
            ),
            Self::SourceUnavailable(err) => write!(f, "program source unavailable: {}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageTooLarge { .. } => None,
            Self::SourceUnavailable(err) => Some(err),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::SourceUnavailable(err)
    }
}

/// Fatal machine fault raised by a single step.
///
/// Indicates a malformed program. The running session should be halted
/// and the fault reported, the machine state is left as it was before
/// the faulting instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmFault {
    /// Memory access outside of the 4K address space.
    AddressOutOfRange { address: usize },
    /// Subroutine call while all stack levels are in use.
    StackOverflow { pc: Address },
    /// Subroutine return with an empty stack.
    StackUnderflow { pc: Address },
}

impl Display for VmFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfRange { address } => {
                write!(f, "address out of range: 0x{address:04X}")
            }
            Self::StackOverflow { pc } => {
                write!(f, "call stack overflow at 0x{pc:04X}, depth {STACK_SIZE}")
            }
            Self::StackUnderflow { pc } => write!(f, "call stack underflow at 0x{pc:04X}"),
        }
    }
}

impl std::error::Error for VmFault {}
