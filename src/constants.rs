/// Bytes of addressable memory.
pub const MEMORY_SIZE: usize = 4096;

/// Programs are loaded, and start executing, at this address.
pub const PROGRAM_ORIGIN: u16 = 0x200;

/// The largest program that fits between the origin and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_ORIGIN as usize;

/// Every instruction is one big-endian 16-bit word.
pub const OPCODE_SIZE: u16 = 2;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_SIZE: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;

/// VF doubles as the carry/borrow/collision flag.
pub const FLAG_REGISTER: usize = 0xF;

/// Each glyph in the sprite sheet is 5 rows tall.
pub const GLYPH_HEIGHT: u16 = 5;

/// Nanoseconds between instructions for a driver running at 500Hz.
pub const CLOCK_SPEED: u64 = 2_000_000;

/// # Sprite Sheet
/// Hex digits 0..F, 8 pixels wide and 5 rows tall, stored at 0x000..0x050.
///
/// ```text
/// "0"       Binary   Hex
/// ****      11110000 0xF0
/// *  *      10010000 0x90
/// *  *      10010000 0x90
/// *  *      10010000 0x90
/// ****      11110000 0xF0
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
