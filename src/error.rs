use std::io;

use thiserror::Error;

use crate::constants::MAX_PROGRAM_SIZE;

/// Reasons a program image can't be placed into memory.
///
/// Memory is never partially written when one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is {len} bytes but at most {max} fit above the program origin")]
    CapacityExceeded { len: usize, max: usize },

    #[error("unable to read program: {0}")]
    IoFailure(#[from] io::Error),

    #[error("expected a {declared} byte program but read {read} bytes")]
    LengthMismatch { declared: usize, read: usize },
}

impl LoadError {
    pub(crate) fn capacity(len: usize) -> Self {
        LoadError::CapacityExceeded {
            len,
            max: MAX_PROGRAM_SIZE,
        }
    }

    /// True when the bytes themselves couldn't be obtained, as opposed to there being too many of them.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            LoadError::IoFailure(_) | LoadError::LengthMismatch { .. }
        )
    }
}

/// Faults raised while executing a single instruction.
///
/// A step that fails leaves the machine exactly as it was before the step began,
/// so `pc` is also the address of the offending instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("call at {pc:#05X} with all 16 stack slots in use")]
    StackOverflow { pc: u16 },

    #[error("return at {pc:#05X} with an empty stack")]
    StackUnderflow { pc: u16 },

    #[error("instruction at {pc:#05X} touched address {address:#06X} outside of memory")]
    AddressOutOfRange { pc: u16, address: usize },
}
