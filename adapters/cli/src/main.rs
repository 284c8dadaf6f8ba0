#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Grid Tactics round between two
//! computer-controlled teams.

mod board;
mod scenario;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use grid_tactics_world::World;
use scenario::Scenario;
use session::{Outcome, Session};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "grid-tactics", about = "Headless Grid Tactics battle runner")]
struct Args {
    /// Scenario file to load instead of the bundled skirmish
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximum number of commands applied before the round is abandoned
    #[arg(long, default_value_t = 2_000)]
    max_steps: usize,

    /// Allow diagonal movement regardless of the scenario rules
    #[arg(long)]
    diagonal: bool,

    /// Override the scenario's blue action point pool
    #[arg(long)]
    max_action_points: Option<u32>,
}

/// Entry point for the Grid Tactics command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };
    if args.diagonal {
        scenario.rules.diagonal_movement = true;
    }
    if let Some(points) = args.max_action_points {
        scenario.rules.max_action_points = points;
    }

    let layout = scenario.layout()?;
    let world = World::with_config(scenario.rules);
    let mut setup = Vec::new();
    scenario.bootstrap().commands(&layout, &mut setup);

    let mut session = Session::new(world, setup);
    println!("{}", scenario.bootstrap().welcome_banner(session.world()));
    println!();
    print!("{}", board::render(session.world()));
    info!(
        scenario = %scenario.name,
        columns = layout.columns(),
        rows = layout.rows(),
        max_action_points = scenario.rules.max_action_points,
        "battle started"
    );

    let report = session.run(args.max_steps);
    let verdict = match report.outcome {
        Outcome::Won => "blue wins",
        Outcome::Lost => "red wins",
        Outcome::Stalemate => "stalemate",
    };
    println!();
    println!(
        "{verdict} after {} commands, {} turns and {} attacks",
        report.steps, report.turns, report.attacks
    );

    Ok(())
}
