use std::fmt::{self, Display, Formatter};

use chip8::prelude::*;

#[derive(Debug)]
pub enum CliError {
    /// Bad command line, the usage text is printed.
    Usage(String),
    Chip8(Chip8Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}"),
            Self::Chip8(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Chip8(err) => Some(err),
        }
    }
}

impl From<Chip8Error> for CliError {
    fn from(err: Chip8Error) -> Self {
        CliError::Chip8(err)
    }
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        CliError::Chip8(err.into())
    }
}

impl From<VmFault> for CliError {
    fn from(err: VmFault) -> Self {
        CliError::Chip8(err.into())
    }
}

impl From<fmt::Error> for CliError {
    fn from(err: fmt::Error) -> Self {
        CliError::Chip8(err.into())
    }
}
