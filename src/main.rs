mod aero;
mod cli;
mod config;
mod core;
mod error;
mod params;
mod physics;
mod render;
mod spatial;
mod types;
mod ui;
mod wind;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, trace};

use crate::{cli::Cli, core::Simulation, params::Project, types::SimulationStats};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    let project = match &cli.project {
        Some(path) => Project::load(path)
            .with_context(|| format!("failed to load project {}", path.display()))?,
        None => Project::default(),
    };

    if cli.headless {
        let stats = run_headless(&project, &cli);
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    ui::run(
        project,
        cli.seed,
        ui::UiOptions {
            auto_loop: cli.auto_loop,
            record: cli.record,
        },
    )
}

fn run_headless(project: &Project, cli: &Cli) -> SimulationStats {
    let mut sim = Simulation::new(project, cli.seed);
    sim.set_director(cli.auto_loop);
    if cli.record {
        sim.start_recording();
    }
    let mut last = SimulationStats::default();
    for _ in 0..cli.frames {
        sim.tick(|stats| {
            trace!("{stats:?}");
            last = stats;
        });
    }
    let stats = SimulationStats {
        fps: last.fps,
        ..sim.stats()
    };
    info!(
        "headless run finished after {} frames: {} particles ({} active, {} baked)",
        cli.frames,
        stats.total_particles,
        sim.active_count(),
        sim.baked_count()
    );
    sim.shutdown();
    stats
}
