#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Ark Descent floors.
//!
//! Loads a floor document, runs the simulation for a fixed number of ticks,
//! and prints the event stream. Useful for soak-testing maps and tuning
//! without a presentation layer.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use ark_descent_controller::{FloorController, Intents};
use ark_descent_core::{CellCoord, Event, Feature, Tuning};
use ark_descent_world::query;

/// Fixed timestep matching the reference presentation rate.
const TICK: Duration = Duration::from_micros(16_667);

/// Runs one floor headless and prints what happens.
#[derive(Debug, Parser)]
#[command(name = "ark-descent", version, about)]
struct Args {
    /// Floor document to load.
    map: PathBuf,

    /// Optional tuning overlay applied on top of the defaults.
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Number of fixed-timestep ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Confirm through the opening briefing before the run starts.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    skip_briefing: bool,

    /// Issue an auto-path request toward `COLUMN,ROW` on the first tick.
    #[arg(long, value_parser = parse_cell)]
    autopath: Option<CellCoord>,
}

fn parse_cell(text: &str) -> Result<CellCoord, String> {
    let (column, row) = text
        .split_once(',')
        .ok_or_else(|| format!("expected COLUMN,ROW, got {text:?}"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("bad column in {text:?}"))?;
    let row = row.trim().parse().map_err(|_| format!("bad row in {text:?}"))?;
    Ok(CellCoord::new(column, row))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => ark_descent_content::load_tuning(path)
            .with_context(|| format!("loading tuning overlay {}", path.display()))?,
        None => Tuning::default(),
    };
    let plan = ark_descent_content::load_map(&args.map, tuning)
        .with_context(|| format!("loading floor document {}", args.map.display()))?;

    let mut controller = FloorController::from_plan(plan);
    println!("{}", query::welcome_banner(controller.floor()));

    if args.skip_briefing {
        let confirm = Intents {
            confirm: true,
            ..Intents::default()
        };
        while query::briefing_active(controller.floor()) {
            for event in controller.tick(&confirm, TICK) {
                print_event(0, &event);
            }
        }
    }

    for tick in 1..=args.ticks {
        let intents = Intents {
            autopath_to: args.autopath.filter(|_| tick == 1),
            ..Intents::default()
        };
        for event in controller.tick(&intents, TICK) {
            print_event(tick, &event);
        }
    }

    let player = query::player_snapshot(controller.floor());
    let enemies = query::enemy_view(controller.floor()).into_vec();
    println!(
        "done: stage {:?}, elevator unlocked {}, player at ({:.1}, {:.1}) hp {}/{} ammo {}, {} enemies remain",
        query::quest_stage(controller.floor()),
        query::is_unlocked(controller.floor(), Feature::Elevator),
        player.position.x(),
        player.position.y(),
        player.health.get(),
        player.max_health.get(),
        player.ammo,
        enemies.len(),
    );
    Ok(())
}

fn print_event(tick: u32, event: &Event) {
    // The clock advance fires every tick; skip it to keep the log readable.
    if matches!(event, Event::TimeAdvanced { .. }) {
        return;
    }
    println!("[{tick:>6}] {event:?}");
}
