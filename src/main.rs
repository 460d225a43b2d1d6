//! Headless level runner
//!
//! Loads a level (the bundled island demo by default), replays its input
//! script or a string of key presses, and logs what happens each tick.
//! Set `RUST_LOG=info` (or `debug`) to see the events.

use std::path::PathBuf;

use clap::Parser;
use tilemaps::prelude::*;

const DEMO_LEVEL: &str = include_str!("../levels/island.ron");

/// Run a tile map level without a window
#[derive(Parser)]
#[command(name = "tilemaps", version, about, long_about = None)]
struct Cli {
    /// Level file (.ron or .json); the bundled demo when omitted
    #[arg(value_name = "LEVEL")]
    level: Option<PathBuf>,

    /// Maximum number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Replace the level's script with key presses (w/a/s/d move, e interacts, . waits)
    #[arg(short, long, value_name = "KEYS")]
    keys: Option<String>,

    /// Frames each key is held
    #[arg(long, default_value_t = 8)]
    frames_per_key: u64,

    /// Print the level as JSON and exit
    #[arg(long)]
    dump_json: bool,
}

fn run(cli: &Cli) -> Result<SimStatus, Box<dyn std::error::Error>> {
    let level = match &cli.level {
        Some(path) => Level::load(path)?,
        None => Level::from_ron_str(DEMO_LEVEL)?,
    };

    if cli.dump_json {
        println!("{}", level.to_json_string()?);
        return Ok(SimStatus::Running);
    }

    let script = match &cli.keys {
        Some(keys) => {
            InputScript::from_keys(keys, &InputMapper::with_defaults(), cli.frames_per_key)
        }
        None => level.script.clone(),
    };

    let mut sim = Simulation::from_level(&level)?;
    let status = sim.run_with(cli.ticks, &script, |sim| {
        let frame = sim.time().frame_count();
        for event in sim.events().iter() {
            log::info!("[{frame:>4}] {event:?}");
        }
    })?;

    println!(
        "{}: {:?} after {} ticks ({:.2}s), player at {}",
        level.name,
        status,
        sim.time().frame_count(),
        sim.time().elapsed_seconds(),
        sim.player().cell()
    );
    Ok(status)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
