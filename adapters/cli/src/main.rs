#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter for the Tower Defence engine.
//!
//! Loads a level document (or a built-in demo layout), runs an elimination
//! battle for a fixed number of ticks, and prints the outcome. Rendering
//! and audio collaborators are absent by design; the event stream drives
//! the printed summary instead.

mod demo;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tower_defence_core::{Event, LevelDocument};
use tower_defence_engine::{Engine, GameState};
use tower_defence_system_waves::{Elimination, EliminationConfig, GameMode};

/// Command-line arguments for the headless runner.
#[derive(Debug, Parser)]
#[command(name = "tower-defence", about = "Headless tower defence battles")]
struct Args {
    /// Level document to load; the built-in demo layout when omitted.
    #[arg(long)]
    level: Option<PathBuf>,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,

    /// Session seed; identical seeds replay identical battles.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Turrets to plant along the road before the battle starts.
    #[arg(long, default_value_t = 2)]
    turrets: u32,

    /// Escapes tolerated per intensity level before the battle is lost.
    #[arg(long, default_value_t = 20)]
    max_escaped: u32,

    /// Write the loaded level back out as JSON and exit.
    #[arg(long)]
    dump_level: Option<PathBuf>,

    /// Raise log verbosity to debug.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let document = match &args.level {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read level file {}", path.display()))?;
            serde_json::from_str::<LevelDocument>(&raw)
                .with_context(|| format!("level file {} does not match the schema", path.display()))?
        }
        None => demo::demo_level(),
    };

    let mode = Elimination::new(EliminationConfig {
        max_escaped: args.max_escaped,
        ..EliminationConfig::default()
    });
    let mut engine = Engine::with_mode(args.seed, Box::new(mode));
    engine.initialize().context("engine initialization failed")?;
    engine
        .load_level(&document)
        .context("level rejected by the engine")?;

    if let Some(path) = &args.dump_level {
        let saved = engine.save_level().context("level save failed")?;
        let json = serde_json::to_string_pretty(&saved).context("level serialization failed")?;
        fs::write(path, json)
            .with_context(|| format!("could not write level file {}", path.display()))?;
        println!("level written to {}", path.display());
        return Ok(());
    }

    engine.start_game().context("battle start failed")?;
    plant_turrets(&mut engine, args.turrets);

    let mut tally = Tally::default();
    let mut ticks_run = 0;
    for _ in 0..args.ticks {
        let events = engine.tick(&[]).context("simulation tick failed")?;
        tally.absorb(&events);
        ticks_run += 1;
        if engine.state() == GameState::Ended {
            break;
        }
    }

    info!(ticks_run, "battle finished");
    println!("ticks        {ticks_run}");
    println!("spawned      {}", tally.spawned);
    println!("shots fired  {}", tally.fired);
    println!("kills        {}", engine.mode().killed());
    println!("escaped      {}", engine.mode().escaped());
    println!("intensity    {}", engine.mode().intensity());
    println!(
        "outcome      {}",
        if engine.mode().has_lost() {
            "overrun"
        } else {
            "holding"
        }
    );
    Ok(())
}

/// Plants up to `count` turrets on the row beneath the demo road.
fn plant_turrets(engine: &mut Engine, count: u32) {
    let mut planted = 0;
    for slot in 0..count {
        let position = demo::turret_position(slot);
        let Some(_) = engine.select_turret(position) else {
            break;
        };
        if engine.place_selection(position) {
            planted += 1;
        } else {
            let _ = engine.clear_selection();
        }
    }
    info!(planted, "turrets placed");
}

#[derive(Debug, Default)]
struct Tally {
    spawned: u32,
    fired: u32,
}

impl Tally {
    fn absorb(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WavePulse { spawned } => self.spawned += spawned,
                Event::TurretFired { .. } => self.fired += 1,
                _ => {}
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
