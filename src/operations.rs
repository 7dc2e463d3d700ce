use std::ops::Range;

use rand::Rng;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH, GLYPH_HEIGHT, MEMORY_SIZE, OPCODE_SIZE,
    STACK_DEPTH,
};
use crate::error::StepError;
use crate::state::State;

// Every operation receives the state with `pc` already pointing past the
// instruction being executed and returns the state that results from it.
// The caller keeps the original until the operation succeeds.

/// A fault raised by an operation; the machine attaches the faulting address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    StackOverflow,
    StackUnderflow,
    AddressOutOfRange(usize),
}

impl Fault {
    pub fn at(self, pc: u16) -> StepError {
        match self {
            Fault::StackOverflow => StepError::StackOverflow { pc },
            Fault::StackUnderflow => StepError::StackUnderflow { pc },
            Fault::AddressOutOfRange(address) => StepError::AddressOutOfRange { pc, address },
        }
    }
}

/// The memory range `start..start + len`, if all of it exists.
/// A zero length touches nothing, so it is empty wherever it starts.
pub fn span(start: u16, len: usize) -> Result<Range<usize>, Fault> {
    if len == 0 {
        return Ok(0..0);
    }
    let start = usize::from(start);
    let end = start + len;
    if end > MEMORY_SIZE {
        return Err(Fault::AddressOutOfRange(start.max(MEMORY_SIZE)));
    }
    Ok(start..end)
}

fn skip_if(state: &State, condition: bool) -> State {
    let pc = if condition {
        state.pc + OPCODE_SIZE
    } else {
        state.pc
    };
    State { pc, ..*state }
}

fn with_register(state: &State, x: u8, value: u8) -> State {
    let mut v = state.v;
    v[usize::from(x)] = value;
    State { v, ..*state }
}

/// Writes `value` to Vx and then `flag` to VF, so VF holds the flag when x is F.
fn with_register_and_flag(state: &State, x: u8, value: u8, flag: bool) -> State {
    let mut next = with_register(state, x, value);
    next.set_flag(flag);
    next
}

/// Writes `flag` to VF and then `value` to Vx, so VF holds the value when x is F.
fn with_flag_and_register(state: &State, flag: bool, x: u8, value: u8) -> State {
    let mut next = *state;
    next.set_flag(flag);
    with_register(&next, x, value)
}

/// clear
pub fn clear_screen(state: &State) -> State {
    State {
        frame_buffer: [0; DISPLAY_SIZE],
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop() + 2
pub fn ret(state: &State) -> Result<State, Fault> {
    let sp = state.sp.checked_sub(1).ok_or(Fault::StackUnderflow)?;
    Ok(State {
        pc: state.stack[usize::from(sp)] + OPCODE_SIZE,
        sp,
        ..*state
    })
}

/// PC = addr
pub fn jump(state: &State, addr: u16) -> State {
    State { pc: addr, ..*state }
}

/// STACK.push(address of this call); PC = addr
pub fn call(state: &State, addr: u16) -> Result<State, Fault> {
    let sp = usize::from(state.sp);
    if sp >= STACK_DEPTH {
        return Err(Fault::StackOverflow);
    }
    let mut stack = state.stack;
    stack[sp] = state.pc - OPCODE_SIZE;
    Ok(State {
        pc: addr,
        sp: state.sp + 1,
        stack,
        ..*state
    })
}

/// if Vx == kk then skip
pub fn skip_eq_imm(state: &State, x: u8, kk: u8) -> State {
    skip_if(state, state.v[usize::from(x)] == kk)
}

/// if Vx != kk then skip
pub fn skip_ne_imm(state: &State, x: u8, kk: u8) -> State {
    skip_if(state, state.v[usize::from(x)] != kk)
}

/// if Vx == Vy then skip
pub fn skip_eq_reg(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[usize::from(x)] == state.v[usize::from(y)])
}

/// if Vx != Vy then skip
pub fn skip_ne_reg(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[usize::from(x)] != state.v[usize::from(y)])
}

/// Vx = kk
pub fn load_imm(state: &State, x: u8, kk: u8) -> State {
    with_register(state, x, kk)
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add_imm(state: &State, x: u8, kk: u8) -> State {
    with_register(state, x, state.v[usize::from(x)].wrapping_add(kk))
}

/// Vx = Vy
pub fn mv(state: &State, x: u8, y: u8) -> State {
    with_register(state, x, state.v[usize::from(y)])
}

/// Vx |= Vy
pub fn or(state: &State, x: u8, y: u8) -> State {
    with_register(state, x, state.v[usize::from(x)] | state.v[usize::from(y)])
}

/// Vx &= Vy
pub fn and(state: &State, x: u8, y: u8) -> State {
    with_register(state, x, state.v[usize::from(x)] & state.v[usize::from(y)])
}

/// Vx ^= Vy
pub fn xor(state: &State, x: u8, y: u8) -> State {
    with_register(state, x, state.v[usize::from(x)] ^ state.v[usize::from(y)])
}

/// Vx += Vy; VF = carry
pub fn add_reg(state: &State, x: u8, y: u8) -> State {
    let (res, carry) = state.v[usize::from(x)].overflowing_add(state.v[usize::from(y)]);
    with_register_and_flag(state, x, res, carry)
}

/// VF = !borrow; Vx -= Vy
pub fn sub(state: &State, x: u8, y: u8) -> State {
    let (res, borrow) = state.v[usize::from(x)].overflowing_sub(state.v[usize::from(y)]);
    with_flag_and_register(state, !borrow, x, res)
}

/// VF = !borrow; Vx = Vy - Vx
pub fn subn(state: &State, x: u8, y: u8) -> State {
    let (res, borrow) = state.v[usize::from(y)].overflowing_sub(state.v[usize::from(x)]);
    with_flag_and_register(state, !borrow, x, res)
}

/// VF = the bit shifted out; Vx >>= 1
pub fn shr(state: &State, x: u8) -> State {
    let value = state.v[usize::from(x)];
    with_flag_and_register(state, value & 0x1 == 0x1, x, value >> 1)
}

/// VF = the bit shifted out; Vx <<= 1
pub fn shl(state: &State, x: u8) -> State {
    let value = state.v[usize::from(x)];
    with_flag_and_register(state, value & 0x80 == 0x80, x, value << 1)
}

/// I = addr
pub fn set_index(state: &State, addr: u16) -> State {
    State { i: addr, ..*state }
}

/// PC = V0 + addr
pub fn jump_offset(state: &State, addr: u16) -> State {
    State {
        pc: addr + u16::from(state.v[0x0]),
        ..*state
    }
}

/// Vx = random byte & kk
pub fn random_and<R: Rng>(state: &State, x: u8, kk: u8, rng: &mut R) -> State {
    with_register(state, x, rng.gen::<u8>() & kk)
}

/// draw_sprite(x=Vx y=Vy rows=n)
/// XORs the sprite at memory I..I+n onto the FrameBuffer at (Vx, Vy).
/// Pixels that land past the right or bottom edge are dropped rather than wrapped.
/// VF is set if any lit pixel was switched off.
pub fn draw(state: &State, x: u8, y: u8, n: u8) -> Result<State, Fault> {
    let rows = span(state.i, usize::from(n))?;
    let left = usize::from(state.v[usize::from(x)]);
    let top = usize::from(state.v[usize::from(y)]);

    let mut frame_buffer = state.frame_buffer;
    let mut collision = false;

    for (row, &sprite) in state.memory[rows].iter().enumerate() {
        let py = top + row;
        if py >= DISPLAY_HEIGHT {
            break;
        }
        for bit in 0..8 {
            let px = left + bit;
            if px >= DISPLAY_WIDTH {
                break;
            }
            if sprite & (0x80 >> bit) == 0 {
                continue;
            }
            let cell = &mut frame_buffer[py * DISPLAY_WIDTH + px];
            collision |= *cell == 1;
            *cell ^= 1;
        }
    }

    let mut next = State {
        frame_buffer,
        draw_flag: true,
        ..*state
    };
    next.set_flag(collision);
    Ok(next)
}

/// if key[Vx] is down then skip
pub fn skip_if_key(state: &State, x: u8) -> State {
    skip_if(state, state.is_pressed(state.v[usize::from(x)]))
}

/// if key[Vx] is up then skip
pub fn skip_if_not_key(state: &State, x: u8) -> State {
    skip_if(state, !state.is_pressed(state.v[usize::from(x)]))
}

/// Vx = DT
pub fn read_delay(state: &State, x: u8) -> State {
    with_register(state, x, state.delay_timer)
}

/// Vx = first key down
/// With no key down the PC is wound back so this instruction runs again next step.
pub fn wait_key(state: &State, x: u8) -> State {
    match state.first_pressed() {
        Some(key) => State {
            waiting_for_key: None,
            ..with_register(state, x, key)
        },
        None => State {
            pc: state.pc - OPCODE_SIZE,
            waiting_for_key: Some(x),
            ..*state
        },
    }
}

/// DT = Vx
pub fn set_delay(state: &State, x: u8) -> State {
    State {
        delay_timer: state.v[usize::from(x)],
        ..*state
    }
}

/// ST = Vx
pub fn set_sound(state: &State, x: u8) -> State {
    State {
        sound_timer: state.v[usize::from(x)],
        ..*state
    }
}

/// VF = I + Vx passes 0xFFF; I += Vx
/// Vx is read again after VF is written, so FF1E adds the new flag.
pub fn add_to_index(state: &State, x: u8) -> State {
    let sum = u32::from(state.i) + u32::from(state.v[usize::from(x)]);
    let mut next = *state;
    next.set_flag(sum > 0xFFF);
    State {
        i: next.i.wrapping_add(u16::from(next.v[usize::from(x)])),
        ..next
    }
}

/// I = Vx * 5
/// Points I at the glyph for the digit in Vx; see constants::SPRITE_SHEET
pub fn font_char(state: &State, x: u8) -> State {
    State {
        i: u16::from(state.v[usize::from(x)]) * GLYPH_HEIGHT,
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
pub fn store_bcd(state: &State, x: u8) -> Result<State, Fault> {
    let value = state.v[usize::from(x)];
    let digits = [value / 100, value / 10 % 10, value % 10];
    let mut memory = state.memory;
    memory[span(state.i, digits.len())?].copy_from_slice(&digits);
    Ok(State { memory, ..*state })
}

/// mem[I..=I+x] = V0..=Vx
pub fn store_registers(state: &State, x: u8) -> Result<State, Fault> {
    let count = usize::from(x) + 1;
    let mut memory = state.memory;
    memory[span(state.i, count)?].copy_from_slice(&state.v[..count]);
    Ok(State { memory, ..*state })
}

/// V0..=Vx = mem[I..=I+x]
pub fn load_registers(state: &State, x: u8) -> Result<State, Fault> {
    let count = usize::from(x) + 1;
    let mut v = state.v;
    v[..count].copy_from_slice(&state.memory[span(state.i, count)?]);
    Ok(State { v, ..*state })
}
