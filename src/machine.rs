use std::io::Read;

use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{KEY_COUNT, MEMORY_SIZE, OPCODE_SIZE};
use crate::error::{LoadError, StepError};
use crate::instruction::Instruction;
use crate::loader;
use crate::opcode::Opcode;
use crate::operations::Fault;
use crate::state::{FrameBuffer, State};

/// What a single call to `Machine::step` did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The PC ran off the end of memory; nothing was executed and the timers were left alone.
    Halted,
    /// The instruction ran to completion.
    Executed(Instruction),
    /// FX0A found no key down and will run again on the next step.
    AwaitingKey(u8),
    /// The fetched word doesn't encode an instruction; it was skipped.
    Unknown(Opcode),
}

/// # Machine
/// The virtual machine and everything it owns.
///
/// Tracks:
///  - current `state`, which includes the key pad
///  - the random number generator used by CXKK
///
/// Supplies interfaces for:
/// - loading programs
/// - pressing and releasing keys
/// - advancing the machine a single step at a time
/// - inspecting its frame buffer for rendering by some display
/// - copying out its whole state
///
/// Pacing is left entirely to the caller: one `step` is one fetch, decode, execute and timer tick.
pub struct Machine {
    state: State,
    rng: StdRng,
}

impl Machine {
    /// A freshly initialized machine whose random numbers come from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A freshly initialized machine with a reproducible random number sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        info!("Initializing machine");
        Machine {
            state: State::new(),
            rng,
        }
    }

    /// Returns the machine to its initial state. Any loaded program is discarded.
    pub fn reset(&mut self) {
        info!("Resetting machine");
        self.state = State::new();
    }

    /// Load a program image at the program origin
    ///
    /// # Arguments
    /// * `program` the raw program bytes; at most 3584 of them
    pub fn load_program(&mut self, program: &[u8]) -> Result<usize, LoadError> {
        match loader::load(&mut self.state, program) {
            Ok(len) => {
                info!("Program loaded, {} bytes", len);
                Ok(len)
            }
            Err(e) => {
                error!("Unable to load program: {}", e);
                Err(e)
            }
        }
    }

    /// Load a program image from some source
    ///
    /// # Arguments
    /// * `reader` a source that yields exactly `declared_len` bytes
    /// * `declared_len` how many bytes the source claims to hold (e.g. a file's size)
    pub fn load_rom(&mut self, reader: &mut dyn Read, declared_len: usize) -> Result<usize, LoadError> {
        let program = loader::read_program(reader, declared_len).map_err(|e| {
            error!("Unable to read program: {}", e);
            e
        })?;
        self.load_program(&program)
    }

    /// Replace the pressed status of every key at once
    pub fn set_input(&mut self, keys: [bool; KEY_COUNT]) {
        self.state.keypad = keys;
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the index of the key that was pressed; anything past 0xF is ignored
    pub fn press_key(&mut self, key: u8) {
        self.set_key(key, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the index of the key that was released; anything past 0xF is ignored
    pub fn release_key(&mut self, key: u8) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: u8, down: bool) {
        match self.state.keypad.get_mut(usize::from(key)) {
            Some(slot) => *slot = down,
            None => debug!("Ignoring key {:#X}", key),
        }
    }

    /// The current contents of the display
    pub fn display(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Returns the FrameBuffer if the display changed since the last call
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    /// Whether a driver should currently be sounding its tone
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// A copy of the whole state; changing it has no effect on the machine
    pub fn snapshot(&self) -> State {
        self.state
    }

    /// Advances the machine by a single step
    /// - does nothing once the PC has left memory
    /// - fetches the next opcode and moves the PC past it
    /// - decodes and executes it
    /// - ticks both timers
    ///
    /// A step that faults changes nothing, so the same fault is raised again by the next step.
    pub fn step(&mut self) -> Result<StepOutcome, StepError> {
        let pc = self.state.pc;
        if usize::from(pc) >= MEMORY_SIZE {
            return Ok(StepOutcome::Halted);
        }

        let opcode = self.fetch().map_err(|fault| Self::fault(fault, pc))?;
        let fetched = State {
            opcode,
            pc: pc + OPCODE_SIZE,
            ..self.state
        };

        let (mut next, outcome) = match Instruction::decode(opcode) {
            Some(instruction) => {
                debug!("{:03X}: {}  {}", pc, opcode, instruction);
                let next = instruction
                    .execute(&fetched, &mut self.rng)
                    .map_err(|fault| Self::fault(fault, pc))?;
                let outcome = match next.waiting_for_key {
                    Some(register) => StepOutcome::AwaitingKey(register),
                    None => StepOutcome::Executed(instruction),
                };
                (next, outcome)
            }
            None => {
                warn!("Unknown instruction {} at {:#05X}", opcode, pc);
                let next = State {
                    unknown_instructions: fetched.unknown_instructions + 1,
                    ..fetched
                };
                (next, StepOutcome::Unknown(opcode))
            }
        };

        Self::tick_timers(&mut next);
        self.state = next;
        Ok(outcome)
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    fn fetch(&self) -> Result<Opcode, Fault> {
        let pc = usize::from(self.state.pc);
        match self.state.memory.get(pc..pc + 2) {
            Some(&[high, low]) => Ok(Opcode::from_bytes(high, low)),
            _ => Err(Fault::AddressOutOfRange(MEMORY_SIZE)),
        }
    }

    fn fault(fault: Fault, pc: u16) -> StepError {
        let e = fault.at(pc);
        error!("{}", e);
        e
    }

    /// Each timer that is still running loses one tick.
    fn tick_timers(state: &mut State) {
        if state.delay_timer > 0 {
            state.delay_timer -= 1;
            trace!("Delay timer now {}", state.delay_timer);
        }
        if state.sound_timer > 0 {
            state.sound_timer -= 1;
            trace!("Sound timer now {}", state.sound_timer);
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SPRITE_SHEET;

    /// A machine running `words` from the program origin.
    fn machine_with(words: &[u16]) -> Machine {
        let program: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
        let mut machine = Machine::with_seed(0x5EED);
        machine.load_program(&program).unwrap();
        machine
    }

    fn run(machine: &mut Machine, steps: usize) {
        for _ in 0..steps {
            machine.step().unwrap();
        }
    }

    #[test]
    fn test_initial_state() {
        let state = Machine::with_seed(1).snapshot();
        assert_eq!(state.memory[..80], SPRITE_SHEET[..]);
        assert_eq!(state.pc, 512);
        assert_eq!((state.i, state.sp), (0, 0));
        assert_eq!((state.delay_timer, state.sound_timer), (0, 0));
        assert!(state.frame_buffer.iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_reset_matches_initial_state() {
        let mut machine = machine_with(&[0x6A42, 0xA123, 0x2300]);
        machine.press_key(0x3);
        run(&mut machine, 3);
        machine.reset();
        assert_eq!(machine.snapshot(), State::new());
    }

    #[test]
    fn test_load_program_boundaries() {
        let mut machine = Machine::with_seed(1);
        assert_eq!(machine.load_program(&[0xAB; 3584]).ok(), Some(3584));

        let mut machine = Machine::with_seed(1);
        let before = machine.snapshot();
        assert!(matches!(
            machine.load_program(&[0xAB; 3585]),
            Err(LoadError::CapacityExceeded { .. })
        ));
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn test_load_program_copies_bytes() {
        let mut machine = Machine::with_seed(1);
        let program: Vec<u8> = (0..=255).collect();
        machine.load_program(&program).unwrap();
        let state = machine.snapshot();
        for (offset, byte) in program.iter().enumerate() {
            assert_eq!(state.memory[512 + offset], *byte);
        }
    }

    #[test]
    fn test_load_rom_rejects_short_source() {
        let mut machine = Machine::with_seed(1);
        let mut source: &[u8] = &[0x00, 0xE0];
        let err = machine.load_rom(&mut source, 8).unwrap_err();
        assert!(err.is_io());
        assert_eq!(machine.snapshot(), State::new());
    }

    #[test]
    fn test_load_rom_reads_source() {
        let mut machine = Machine::with_seed(1);
        let mut source: &[u8] = &[0x12, 0x34];
        assert_eq!(machine.load_rom(&mut source, 2).ok(), Some(2));
        assert_eq!(machine.snapshot().memory[0x200..0x202], [0x12, 0x34]);
    }

    #[test]
    fn test_step_advances_pc() {
        let mut machine = machine_with(&[0x00E0]);
        let outcome = machine.step().unwrap();
        assert_eq!(outcome, StepOutcome::Executed(Instruction::ClearScreen));
        let state = machine.snapshot();
        assert_eq!(state.pc, 0x202);
        assert_eq!(state.opcode, Opcode(0x00E0));
    }

    #[test]
    fn test_step_is_a_noop_past_memory() {
        let mut machine = machine_with(&[0x6005, 0xF015, 0x1FFE]);
        run(&mut machine, 3);
        // 0xFFE holds 0000, which clears the screen
        assert_eq!(
            machine.step(),
            Ok(StepOutcome::Executed(Instruction::ClearScreen))
        );
        let halted = machine.snapshot();
        assert_eq!(halted.pc, 0x1000);
        assert_eq!(machine.step(), Ok(StepOutcome::Halted));
        assert_eq!(machine.snapshot(), halted);
    }

    #[test]
    fn test_zeroed_memory_clears_the_screen() {
        // draw the "0" glyph, then run into the zeroed word after the program
        let mut machine = machine_with(&[0xD005]);
        machine.step().unwrap();
        assert_eq!(machine.display().iter().filter(|&&cell| cell == 1).count(), 14);
        machine.step().unwrap();
        assert!(machine.display().iter().all(|&cell| cell == 0));
        assert_eq!(machine.snapshot().unknown_instructions, 0);
    }

    #[test]
    fn test_unknown_instruction_is_counted_and_skipped() {
        let mut machine = machine_with(&[0x8008, 0x6107]);
        assert_eq!(machine.step(), Ok(StepOutcome::Unknown(Opcode(0x8008))));
        let state = machine.snapshot();
        assert_eq!(state.pc, 0x202);
        assert_eq!(state.unknown_instructions, 1);
        machine.step().unwrap();
        assert_eq!(machine.snapshot().v[0x1], 0x07);
    }

    #[test]
    fn test_fetch_at_last_byte_faults() {
        let mut machine = machine_with(&[0x1FFF]);
        machine.step().unwrap();
        assert_eq!(
            machine.step(),
            Err(StepError::AddressOutOfRange {
                pc: 0xFFF,
                address: 0x1000
            })
        );
    }

    #[test]
    fn test_timers_tick_once_per_step() {
        // V0 = 3; DT = V0; ST = V0; then idle
        let mut machine = machine_with(&[0x6003, 0xF015, 0xF018, 0x6100, 0x6100, 0x6100, 0x6100]);
        run(&mut machine, 2);
        assert_eq!(machine.snapshot().delay_timer, 2);
        machine.step().unwrap();
        let state = machine.snapshot();
        assert_eq!((state.delay_timer, state.sound_timer), (1, 2));
        assert!(machine.sound_active());
        run(&mut machine, 4);
        let state = machine.snapshot();
        assert_eq!((state.delay_timer, state.sound_timer), (0, 0));
        assert!(!machine.sound_active());
    }

    #[test]
    fn test_call_then_return_round_trip() {
        // 200: CALL 204; 202: LD V1, 01; 204: RET
        let mut machine = machine_with(&[0x2204, 0x6101, 0x00EE]);
        machine.step().unwrap();
        let called = machine.snapshot();
        assert_eq!(called.pc, 0x204);
        assert_eq!(called.sp, 1);
        assert_eq!(called.stack[0], 0x200);

        machine.step().unwrap();
        let returned = machine.snapshot();
        assert_eq!(returned.pc, 0x202);
        assert_eq!(returned.sp, 0);
    }

    #[test]
    fn test_stack_overflow_leaves_state_untouched() {
        // calls itself forever
        let mut machine = machine_with(&[0x2200]);
        run(&mut machine, 16);
        let full = machine.snapshot();
        assert_eq!(full.sp, 16);
        assert_eq!(machine.step(), Err(StepError::StackOverflow { pc: 0x200 }));
        assert_eq!(machine.snapshot(), full);
    }

    #[test]
    fn test_stack_underflow_faults() {
        let mut machine = machine_with(&[0x00EE]);
        let before = machine.snapshot();
        assert_eq!(machine.step(), Err(StepError::StackUnderflow { pc: 0x200 }));
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn test_sprite_drawn_twice_collides() {
        // I = glyph "8"; draw it twice at (V0, V1)
        let mut machine = machine_with(&[0x6008, 0xF029, 0x610A, 0xD015, 0xD015]);
        run(&mut machine, 4);
        assert_eq!(machine.snapshot().vf(), 0);
        assert!(machine.display().iter().any(|&cell| cell == 1));

        machine.step().unwrap();
        assert_eq!(machine.snapshot().vf(), 1);
        assert!(machine.display().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_take_frame_only_after_drawing() {
        let mut machine = machine_with(&[0x6000, 0xD005, 0x6000]);
        assert_eq!(machine.take_frame(), None);
        run(&mut machine, 2);
        let frame = machine.take_frame().expect("draw should flag the frame");
        assert_eq!(frame[..4], [1, 1, 1, 1]);
        assert_eq!(machine.take_frame(), None);
        machine.step().unwrap();
        assert_eq!(machine.take_frame(), None);
    }

    #[test]
    fn test_wait_key_blocks_until_pressed() {
        let mut machine = machine_with(&[0xF50A, 0x6101]);
        for _ in 0..5 {
            assert_eq!(machine.step(), Ok(StepOutcome::AwaitingKey(0x5)));
            assert_eq!(machine.snapshot().pc, 0x200);
        }

        let mut keys = [false; 16];
        keys[0xC] = true;
        machine.set_input(keys);

        assert_eq!(
            machine.step(),
            Ok(StepOutcome::Executed(Instruction::WaitKey(0x5)))
        );
        let state = machine.snapshot();
        assert_eq!(state.v[0x5], 0xC);
        assert_eq!(state.pc, 0x202);
        assert_eq!(state.waiting_for_key, None);
    }

    #[test]
    fn test_wait_key_lets_timers_run() {
        let mut machine = machine_with(&[0x6004, 0xF015, 0xF10A]);
        run(&mut machine, 5);
        assert_eq!(machine.snapshot().delay_timer, 0);
    }

    #[test]
    fn test_press_and_release_key() {
        let mut machine = machine_with(&[0x6207, 0xE29E, 0x6301, 0x6302]);
        machine.press_key(0x7);
        machine.press_key(0x42);
        run(&mut machine, 2);
        assert_eq!(machine.snapshot().pc, 0x206);

        machine.reset();
        machine.load_program(&[0x62, 0x07, 0xE2, 0x9E]).unwrap();
        machine.press_key(0x7);
        machine.release_key(0x7);
        run(&mut machine, 2);
        assert_eq!(machine.snapshot().pc, 0x204);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let machine = machine_with(&[0x00E0]);
        let mut snapshot = machine.snapshot();
        snapshot.v[0x0] = 0xFF;
        snapshot.memory[0x200] = 0xFF;
        assert_eq!(machine.snapshot().v[0x0], 0x00);
        assert_eq!(machine.snapshot().memory[0x200], 0x00);
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let mut first = machine_with(&[0xC0FF, 0xC1FF, 0xC2FF]);
        let mut second = machine_with(&[0xC0FF, 0xC1FF, 0xC2FF]);
        run(&mut first, 3);
        run(&mut second, 3);
        assert_eq!(first.snapshot().v, second.snapshot().v);
    }

    #[test]
    fn test_bcd_then_load_registers() {
        // V0 = 254; I = 300; B = V0; V0..V2 = [I]
        let mut machine = machine_with(&[0x60FE, 0xA300, 0xF033, 0xF265]);
        run(&mut machine, 4);
        assert_eq!(machine.snapshot().v[..3], [2, 5, 4]);
    }
}
