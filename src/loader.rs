use std::io::Read;

use crate::constants::{MAX_PROGRAM_SIZE, PROGRAM_ORIGIN};
use crate::error::LoadError;
use crate::state::State;

/// Copies `program` into memory at the program origin.
///
/// Only memory at and above the origin is touched; registers, timers and the stack are left as they are.
/// Returns the number of bytes written.
pub fn load(state: &mut State, program: &[u8]) -> Result<usize, LoadError> {
    if program.len() > MAX_PROGRAM_SIZE {
        return Err(LoadError::capacity(program.len()));
    }
    let origin = usize::from(PROGRAM_ORIGIN);
    state.memory[origin..origin + program.len()].copy_from_slice(program);
    Ok(program.len())
}

/// Reads a program image that is expected to be exactly `declared_len` bytes long.
///
/// At most one byte more than declared is read so that an oversized source is still detected
/// without draining it.
pub fn read_program(reader: &mut dyn Read, declared_len: usize) -> Result<Vec<u8>, LoadError> {
    if declared_len > MAX_PROGRAM_SIZE {
        return Err(LoadError::capacity(declared_len));
    }
    let mut program = Vec::with_capacity(declared_len);
    reader
        .take(declared_len as u64 + 1)
        .read_to_end(&mut program)?;
    if program.len() != declared_len {
        return Err(LoadError::LengthMismatch {
            declared: declared_len,
            read: program.len(),
        });
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
        }
    }

    #[test]
    fn test_load_copies_to_origin() {
        let mut state = State::new();
        assert_eq!(load(&mut state, &[0x01, 0x23, 0x45, 0x67]).ok(), Some(4));
        assert_eq!(state.memory[0x200..0x204], [0x01, 0x23, 0x45, 0x67]);
        assert_eq!(state.memory[0x204], 0x00);
    }

    #[test]
    fn test_load_leaves_registers_alone() {
        let mut state = State::new();
        state.v[0x3] = 0x33;
        state.pc = 0x240;
        state.delay_timer = 0x9;
        load(&mut state, &[0xFF; 16]).unwrap();
        assert_eq!(state.v[0x3], 0x33);
        assert_eq!(state.pc, 0x240);
        assert_eq!(state.delay_timer, 0x9);
    }

    #[test]
    fn test_load_fills_memory() {
        let mut state = State::new();
        assert_eq!(load(&mut state, &[0x1; 3584]).ok(), Some(3584));
        assert_eq!(state.memory[4095], 0x1);
    }

    #[test]
    fn test_load_rejects_oversized_program() {
        let mut state = State::new();
        let before = state;
        let err = load(&mut state, &[0x1; 3585]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CapacityExceeded {
                len: 3585,
                max: 3584
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_read_program_exact() {
        let mut source: &[u8] = &[0x00, 0xE0, 0x12, 0x00];
        assert_eq!(
            read_program(&mut source, 4).unwrap(),
            vec![0x00, 0xE0, 0x12, 0x00]
        );
    }

    #[test]
    fn test_read_program_short_read() {
        let mut source: &[u8] = &[0x00, 0xE0];
        let err = read_program(&mut source, 4).unwrap_err();
        assert!(matches!(
            err,
            LoadError::LengthMismatch {
                declared: 4,
                read: 2
            }
        ));
    }

    #[test]
    fn test_read_program_long_read() {
        let mut source: &[u8] = &[0x00, 0xE0, 0x12, 0x00];
        let err = read_program(&mut source, 2).unwrap_err();
        assert!(matches!(
            err,
            LoadError::LengthMismatch {
                declared: 2,
                read: 3
            }
        ));
    }

    #[test]
    fn test_read_program_reader_error() {
        let err = read_program(&mut Broken, 2).unwrap_err();
        assert!(matches!(err, LoadError::IoFailure(_)));
    }

    #[test]
    fn test_read_program_declared_too_large() {
        let mut source: &[u8] = &[];
        let err = read_program(&mut source, 4000).unwrap_err();
        assert!(matches!(err, LoadError::CapacityExceeded { len: 4000, .. }));
    }
}
