use std::fmt;

use rand::Rng;

use crate::opcode::Opcode;
use crate::operations::{self, Fault};
use crate::state::State;

/// A decoded instruction along with its operands.
///
/// Register operands are indices 0x0..=0xF, addresses are 12 bits wide.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqImm(u8, u8),
    /// 4xkk
    SkipNeImm(u8, u8),
    /// 5xy_
    SkipEqReg(u8, u8),
    /// 6xkk
    LoadImm(u8, u8),
    /// 7xkk
    AddImm(u8, u8),
    /// 8xy0
    Move(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4
    AddReg(u8, u8),
    /// 8xy5
    Sub(u8, u8),
    /// 8x_6
    ShiftRight(u8),
    /// 8xy7
    SubReverse(u8, u8),
    /// 8x_E
    ShiftLeft(u8),
    /// 9xy_
    SkipNeReg(u8, u8),
    /// Annn
    SetIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    RandomAnd(u8, u8),
    /// Dxyn
    Draw(u8, u8, u8),
    /// Ex9E
    SkipIfKey(u8),
    /// ExA1
    SkipIfNotKey(u8),
    /// Fx07
    ReadDelay(u8),
    /// Fx0A
    WaitKey(u8),
    /// Fx15
    SetDelay(u8),
    /// Fx18
    SetSound(u8),
    /// Fx1E
    AddToIndex(u8),
    /// Fx29
    FontChar(u8),
    /// Fx33
    StoreBcd(u8),
    /// Fx55
    StoreRegisters(u8),
    /// Fx65
    LoadRegisters(u8),
}

impl Instruction {
    /// Selects the Instruction for an Opcode, or None if no instruction is encoded by it.
    pub fn decode(op: Opcode) -> Option<Self> {
        use Instruction::*;

        let instruction = match op.nibbles() {
            (0x0, _, _, 0x0) => ClearScreen,
            (0x0, _, _, 0xE) => Return,
            (0x1, ..) => Jump(op.addr()),
            (0x2, ..) => Call(op.addr()),
            (0x3, x, ..) => SkipEqImm(x, op.kk()),
            (0x4, x, ..) => SkipNeImm(x, op.kk()),
            (0x5, x, y, _) => SkipEqReg(x, y),
            (0x6, x, ..) => LoadImm(x, op.kk()),
            (0x7, x, ..) => AddImm(x, op.kk()),
            (0x8, x, y, 0x0) => Move(x, y),
            (0x8, x, y, 0x1) => Or(x, y),
            (0x8, x, y, 0x2) => And(x, y),
            (0x8, x, y, 0x3) => Xor(x, y),
            (0x8, x, y, 0x4) => AddReg(x, y),
            (0x8, x, y, 0x5) => Sub(x, y),
            (0x8, x, _, 0x6) => ShiftRight(x),
            (0x8, x, y, 0x7) => SubReverse(x, y),
            (0x8, x, _, 0xE) => ShiftLeft(x),
            (0x9, x, y, _) => SkipNeReg(x, y),
            (0xA, ..) => SetIndex(op.addr()),
            (0xB, ..) => JumpOffset(op.addr()),
            (0xC, x, ..) => RandomAnd(x, op.kk()),
            (0xD, x, y, n) => Draw(x, y, n),
            (0xE, x, _, 0xE) => SkipIfKey(x),
            (0xE, x, _, 0x1) => SkipIfNotKey(x),
            (0xF, x, 0x0, 0x7) => ReadDelay(x),
            (0xF, x, 0x0, 0xA) => WaitKey(x),
            (0xF, x, 0x1, 0x5) => SetDelay(x),
            (0xF, x, 0x1, 0x8) => SetSound(x),
            (0xF, x, 0x1, 0xE) => AddToIndex(x),
            (0xF, x, 0x2, 0x9) => FontChar(x),
            (0xF, x, 0x3, 0x3) => StoreBcd(x),
            (0xF, x, 0x5, 0x5) => StoreRegisters(x),
            (0xF, x, 0x6, 0x5) => LoadRegisters(x),
            _ => return None,
        };
        Some(instruction)
    }

    /// Applies the instruction to `state`, whose `pc` must already point past it.
    pub(crate) fn execute<R: Rng>(self, state: &State, rng: &mut R) -> Result<State, Fault> {
        use Instruction::*;

        let next = match self {
            ClearScreen => operations::clear_screen(state),
            Return => operations::ret(state)?,
            Jump(addr) => operations::jump(state, addr),
            Call(addr) => operations::call(state, addr)?,
            SkipEqImm(x, kk) => operations::skip_eq_imm(state, x, kk),
            SkipNeImm(x, kk) => operations::skip_ne_imm(state, x, kk),
            SkipEqReg(x, y) => operations::skip_eq_reg(state, x, y),
            LoadImm(x, kk) => operations::load_imm(state, x, kk),
            AddImm(x, kk) => operations::add_imm(state, x, kk),
            Move(x, y) => operations::mv(state, x, y),
            Or(x, y) => operations::or(state, x, y),
            And(x, y) => operations::and(state, x, y),
            Xor(x, y) => operations::xor(state, x, y),
            AddReg(x, y) => operations::add_reg(state, x, y),
            Sub(x, y) => operations::sub(state, x, y),
            ShiftRight(x) => operations::shr(state, x),
            SubReverse(x, y) => operations::subn(state, x, y),
            ShiftLeft(x) => operations::shl(state, x),
            SkipNeReg(x, y) => operations::skip_ne_reg(state, x, y),
            SetIndex(addr) => operations::set_index(state, addr),
            JumpOffset(addr) => operations::jump_offset(state, addr),
            RandomAnd(x, kk) => operations::random_and(state, x, kk, rng),
            Draw(x, y, n) => operations::draw(state, x, y, n)?,
            SkipIfKey(x) => operations::skip_if_key(state, x),
            SkipIfNotKey(x) => operations::skip_if_not_key(state, x),
            ReadDelay(x) => operations::read_delay(state, x),
            WaitKey(x) => operations::wait_key(state, x),
            SetDelay(x) => operations::set_delay(state, x),
            SetSound(x) => operations::set_sound(state, x),
            AddToIndex(x) => operations::add_to_index(state, x),
            FontChar(x) => operations::font_char(state, x),
            StoreBcd(x) => operations::store_bcd(state, x)?,
            StoreRegisters(x) => operations::store_registers(state, x)?,
            LoadRegisters(x) => operations::load_registers(state, x)?,
        };
        Ok(next)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {:03X}", addr),
            Call(addr) => write!(f, "CALL {:03X}", addr),
            SkipEqImm(x, kk) => write!(f, "SE V{:X}, {:02X}", x, kk),
            SkipNeImm(x, kk) => write!(f, "SNE V{:X}, {:02X}", x, kk),
            SkipEqReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm(x, kk) => write!(f, "LD V{:X}, {:02X}", x, kk),
            AddImm(x, kk) => write!(f, "ADD V{:X}, {:02X}", x, kk),
            Move(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(x) => write!(f, "SHR V{:X}", x),
            SubReverse(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x) => write!(f, "SHL V{:X}", x),
            SkipNeReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex(addr) => write!(f, "LD I, {:03X}", addr),
            JumpOffset(addr) => write!(f, "JP V0, {:03X}", addr),
            RandomAnd(x, kk) => write!(f, "RND V{:X}, {:02X}", x, kk),
            Draw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {:X}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP V{:X}", x),
            SkipIfNotKey(x) => write!(f, "SKNP V{:X}", x),
            ReadDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddToIndex(x) => write!(f, "ADD I, V{:X}", x),
            FontChar(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegisters(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
