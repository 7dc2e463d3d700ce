use std::convert::TryFrom;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{info, warn};

use panaroia::{Machine, StepOutcome, CLOCK_SPEED, KEY_COUNT};

use crate::render::render;

/// Steps per second when `--hz` isn't given; one step every `CLOCK_SPEED` nanoseconds.
pub const DEFAULT_HZ: u64 = 1_000_000_000 / CLOCK_SPEED;

/// Used when no `--cycles` are given so a program that never halts still returns.
pub const DEFAULT_CYCLE_CAP: u64 = 1_000_000;

pub struct Config {
    pub rom: PathBuf,
    pub cycles: Option<u64>,
    pub hz: u64,
    pub held: [bool; KEY_COUNT],
    pub seed: Option<u64>,
}

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let mut machine = match config.seed {
        Some(seed) => Machine::with_seed(seed),
        None => Machine::new(),
    };

    // Load ROM
    let file = File::open(&config.rom)?;
    let declared_len = usize::try_from(file.metadata()?.len())?;
    let mut reader = BufReader::new(file);
    let len = machine.load_rom(&mut reader, declared_len)?;
    info!("Loaded {} ({} bytes)", config.rom.display(), len);

    machine.set_input(config.held);

    // Set initial timing; 0 hz runs as fast as possible
    let cycle_time = match config.hz {
        0 => None,
        hz => Some(Duration::from_nanos(1_000_000_000 / hz)),
    };
    let mut last_cycle: Instant = Instant::now();

    let cycles = config.cycles.unwrap_or(DEFAULT_CYCLE_CAP);
    let mut executed: u64 = 0;
    let mut frames: u64 = 0;
    let mut outcome = None;

    while executed < cycles {
        let step = machine.step()?;
        outcome = Some(step);
        if step == StepOutcome::Halted {
            info!("Program counter left memory after {} steps", executed);
            break;
        }
        executed += 1;

        if machine.take_frame().is_some() {
            frames += 1;
        }

        // Handle timing
        if let Some(cycle_time) = cycle_time {
            let elapsed_cycle_time = last_cycle.elapsed();
            if cycle_time > elapsed_cycle_time {
                std::thread::sleep(cycle_time - elapsed_cycle_time);
            }
            last_cycle = Instant::now();
        }
    }

    if let Some(StepOutcome::AwaitingKey(register)) = outcome {
        warn!("Stopped while waiting for a key for V{:X}", register);
    }

    let state = machine.snapshot();
    info!(
        "Ran {} steps, {} frames drawn, {} unknown instructions, pc = {:#05X}",
        executed, frames, state.unknown_instructions, state.pc
    );
    println!("{}", render(machine.display()));
    Ok(())
}
