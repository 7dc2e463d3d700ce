use crate::constants::{
    DISPLAY_SIZE, FLAG_REGISTER, KEY_COUNT, MEMORY_SIZE, PROGRAM_ORIGIN, REGISTER_COUNT,
    SPRITE_SHEET, STACK_DEPTH,
};
use crate::opcode::Opcode;

/// The FrameBuffer is row-major: the pixel at (x, y) lives at `y * DISPLAY_WIDTH + x`.
/// Every cell is either 0 or 1.
pub type FrameBuffer = [u8; DISPLAY_SIZE];

/// A snapshot of the machine's internal state
///
/// ## CPU
/// Registers
/// - (v) 16 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow and collision flag
/// - (i) the index register, used for memory-relative addressing
///
/// Counter
/// - (pc) address of the next instruction to fetch
///
/// Pointer
/// - (sp) index of the next free stack slot
///
/// Timers
/// - 2 8-bit timers (delay & sound) that count down once per step
///
/// ## Memory
/// - 16 slot return address stack
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - 0x200.. holds the loaded program
/// - 64x32 frame buffer
///
/// ## Input
/// - 16 keys, replaced wholesale by the driver
/// - `waiting_for_key` names the register that a blocked FX0A will write to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub memory: [u8; MEMORY_SIZE],
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub stack: [u16; STACK_DEPTH],
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub keypad: [bool; KEY_COUNT],
    pub waiting_for_key: Option<u8>,
    pub opcode: Opcode,
    pub unknown_instructions: u64,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            memory,
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ORIGIN,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            frame_buffer: [0; DISPLAY_SIZE],
            draw_flag: false,
            keypad: [false; KEY_COUNT],
            waiting_for_key: None,
            opcode: Opcode::default(),
            unknown_instructions: 0,
        }
    }

    pub fn vf(&self) -> u8 {
        self.v[FLAG_REGISTER]
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.v[FLAG_REGISTER] = u8::from(flag);
    }

    /// Whether the key named by the low nibble of `key` is held down.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keypad[usize::from(key & 0xF)]
    }

    /// The lowest-numbered key that is held down, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keypad.iter().position(|&down| down).map(|key| key as u8)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
