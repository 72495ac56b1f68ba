mod app;
mod state;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "godray-desktop", about = "God's ray light scattering demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Asset root the effect files are resolved against
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Seed for cube placement; derived from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of cubes to scatter
    #[arg(long, default_value_t = 100)]
    cubes: usize,

    /// Window title
    #[arg(long, default_value = "Minko Example - God's Ray")]
    title: String,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// A startup failure turns into a non-zero exit; a closed window is a clean one.
fn exit_result(startup_error: Option<anyhow::Error>) -> Result<()> {
    match startup_error {
        Some(e) => Err(e.context("godray-desktop failed to start")),
        None => Ok(()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let seed = cli.seed.unwrap_or_else(clock_seed);
    tracing::info!(
        "godray-desktop starting: assets={} seed={seed}",
        cli.assets.display()
    );

    let state = state::AppState::new(cli.assets, seed, cli.cubes, cli.width, cli.height)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::DemoApp::new(state, cli.title, cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    exit_result(app.take_startup_error())
}
