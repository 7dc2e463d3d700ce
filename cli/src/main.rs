use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

mod keymap;
mod render;
mod run;

#[derive(Parser)]
#[command(name = "panaroia")]
#[command(about = "Runs a Chip-8 program headlessly and prints its final display")]
struct Args {
    #[arg(help = "ROM file to load")]
    rom: PathBuf,

    #[arg(long, help = "Number of steps to run [default: until halted, at most 1000000]")]
    cycles: Option<u64>,

    #[arg(long, default_value_t = run::DEFAULT_HZ, help = "Steps per second, 0 runs unpaced")]
    hz: u64,

    #[arg(long, value_parser = keymap::parse_held, help = "Keys held for the whole run, e.g. w,0xA")]
    hold: Option<[bool; panaroia::KEY_COUNT]>,

    #[arg(long, help = "Seed for the random number generator")]
    seed: Option<u64>,

    #[arg(long, help = "Log every executed instruction")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let core_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_module("panaroia", core_level)
        // this binary is also named panaroia, so its targets share the library's prefix
        .filter_module("panaroia::run", LevelFilter::Info)
        .parse_default_env()
        .init();

    run::run(run::Config {
        rom: args.rom,
        cycles: args.cycles,
        hz: args.hz,
        held: args.hold.unwrap_or_default(),
        seed: args.seed,
    })
}
