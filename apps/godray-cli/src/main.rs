use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use godray_assets::{AssetLibrary, Geometry};
use godray_common::Transform;
use godray_input::{MouseInput, OrbitController};
use godray_render::{DebugTextRenderer, RenderView, Renderer};
use godray_scene::{Scene, SphereRng, spawn_random_cubes};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const BASIC_EFFECT: &str = "effect/Basic.effect";
const SCATTERING_EFFECT: &str = "effect/LightScattering/LightScattering.effect";

#[derive(Parser)]
#[command(name = "godray-cli", about = "Headless tooling for the god's ray demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Load the demo's effects and report what was found
    Validate {
        /// Asset root
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
    },
    /// Populate the scene and step the orbit camera without a window
    Simulate {
        /// Number of frames to advance
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seed for cube placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Number of cubes to scatter
        #[arg(long, default_value = "100")]
        cubes: usize,
        /// Input applied before the first frame: down, up, move:DX,DY, wheel:V
        #[arg(short, long = "input")]
        inputs: Vec<String>,
        /// Surfaces to list in the text render
        #[arg(long, default_value = "5")]
        list: usize,
    },
}

struct Simulation {
    scene: Scene,
    orbit: OrbitController,
}

fn simulate(frames: u32, seed: u64, cubes: usize, inputs: &[MouseInput]) -> Result<Simulation> {
    let mut scene = Scene::new();
    let meshes = scene.add_child(scene.root(), Some("meshes"), Transform::default())?;
    let mut rng = SphereRng::new(seed);
    spawn_random_cubes(&mut scene, meshes, &mut rng, cubes, "cube", BASIC_EFFECT)?;
    tracing::debug!("spawned {} cube(s) with seed {seed}", scene.surface_count());

    let mut orbit = OrbitController::default();
    for input in inputs {
        orbit.apply(*input);
    }
    for _ in 0..frames {
        orbit.advance();
    }
    tracing::debug!("advanced orbit {frames} frame(s) after {} input(s)", inputs.len());
    Ok(Simulation { scene, orbit })
}

fn parse_inputs(tokens: &[String]) -> Result<Vec<MouseInput>> {
    tokens
        .iter()
        .map(|t| MouseInput::parse(t).with_context(|| format!("invalid input `{t}`")))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("godray-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", godray_assets::crate_info());
            println!("input: {}", godray_input::crate_info());
            println!("render: {}", godray_render::crate_info());
        }
        Commands::Validate { assets } => {
            let mut library = AssetLibrary::new(&assets);
            library.queue(SCATTERING_EFFECT).queue(BASIC_EFFECT);
            library.set_geometry("cube", Geometry::cube());
            let ids = library
                .load()
                .with_context(|| format!("loading effects from {}", assets.display()))?;
            tracing::info!("validated {} effect(s) under {}", ids.len(), assets.display());

            for path in [SCATTERING_EFFECT, BASIC_EFFECT] {
                let effect = library.require_effect(path)?;
                println!(
                    "{path}: name={} id={:#018x} entries={}/{} uniforms={}",
                    effect.name,
                    effect.id.0,
                    effect.vertex_entry,
                    effect.fragment_entry,
                    effect.uniforms.len()
                );
            }
            println!("OK: {} assets registered", library.len());
        }
        Commands::Simulate {
            frames,
            seed,
            cubes,
            inputs,
            list,
        } => {
            let inputs = parse_inputs(&inputs)?;
            let sim = simulate(frames, seed, cubes, &inputs)?;
            let o = &sim.orbit;
            println!("Simulated {frames} frame(s), seed={seed}");
            println!(
                "Orbit: yaw={:.4} pitch={:.4} distance={:.2} speed=({:.5}, {:.5}) dragging={}",
                o.yaw,
                o.pitch,
                o.distance,
                o.rotation_x_speed,
                o.rotation_y_speed,
                o.is_dragging()
            );
            let view = RenderView::new(o.eye(), o.look_at);
            print!(
                "{}",
                DebugTextRenderer::with_limit(list).render(&sim.scene, &view)
            );
        }
    }

    Ok(())
}
