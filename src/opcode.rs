use std::fmt;

/// # Opcodes
///
/// Instruction words are 16 bits, fetched big-endian. Their behavior is cased on some combination of:
/// - `(n, _, _, _)` the instruction group; applies to all opcodes
/// - `(_, _, _, n)` specific behavior within group 0x8
/// - `(0, 0, n, n)` the two group 0x0 instructions, which are matched as whole words
/// - `(_, _, n, n)` specific behavior within groups 0xE and 0xF
///
/// Nibbles not used to select the behavior carry operands.
/// - `(_, n, n, n)` a 12-bit address
/// - `(_, _, n, n)` an 8-bit immediate that is assigned to and/or compared with Vx
/// - `(_, n, _, _)` the register Vx, or the last register of the range V0..=Vx
/// - `(_, _, n, _)` the register Vy
/// - `(_, _, _, n)` a 4-bit count (sprite height)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Combines the two bytes of an instruction, high byte first.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode(u16::from_be_bytes([high, low]))
    }

    /// The component nibbles, most significant first.
    pub fn nibbles(self) -> (u8, u8, u8, u8) {
        (self.group(), self.x(), self.y(), self.n())
    }

    /// `[g___]`
    pub fn group(self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    /// `[_x__]`
    pub fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// `[__y_]`
    pub fn y(self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// `[___n]`
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// `[__kk]`
    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// `[_nnn]`
    pub fn addr(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
