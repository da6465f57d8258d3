use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use macroquad::prelude::*;
use ::rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

use trackrunner::controller::random_population;
use trackrunner::stats::RunStats;
use trackrunner::{GenerationRunner, RunState, SimConfig, Termination};

mod renderer;
mod ui;

use ui::{StatusLine, UiState};

const FREE_COLOR: [u8; 4] = [24, 28, 36, 255];
const OBSTACLE_COLOR: [u8; 4] = [255, 255, 255, 255];
const GENERATION_HISTORY: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "trackrunner", about = "Watch a population drive around a raster track")]
struct Args {
    /// Track image; border pixels are obstacles.
    #[arg(long, default_value = "map.png")]
    track: PathBuf,

    /// Optional JSON file overriding simulation constants.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 30)]
    population: usize,

    /// Hidden neurons per controller.
    #[arg(long, default_value_t = 8)]
    hidden: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Trackrunner".to_string(),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{err:#}");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let runner = GenerationRunner::from_track_file(&args.track, config)
        .with_context(|| format!("loading track {}", args.track.display()))?;

    let track = runner.track();
    let (width, height) = track.dimensions();
    let width = u16::try_from(width).context("track too wide for a texture")?;
    let height = u16::try_from(height).context("track too tall for a texture")?;
    let pixels = track.mask_rgba(FREE_COLOR, OBSTACLE_COLOR);
    let texture = Texture2D::from_rgba8(width, height, &pixels);
    texture.set_filter(FilterMode::Nearest);

    let tick_budget = runner.config().tick_budget;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut stats = RunStats::new(tick_budget as usize, GENERATION_HISTORY);
    let mut ui_state = UiState::default();

    let mut generation = 0u64;
    let mut current = runner.start(
        generation,
        random_population(args.population, args.hidden, &mut rng),
    );
    info!(population = args.population, seed = args.seed, "Viewer started");

    loop {
        if is_key_pressed(KeyCode::Escape) {
            runner.stop_signal().raise();
        }
        if is_key_pressed(KeyCode::Space) {
            ui_state.paused = !ui_state.paused;
        }
        if is_key_pressed(KeyCode::R) {
            ui_state.show_rays = !ui_state.show_rays;
        }

        let ticks = if ui_state.paused {
            u32::from(std::mem::take(&mut ui_state.step_requested))
        } else {
            ui_state.ticks_per_frame
        };

        for _ in 0..ticks {
            let state = current.step()?;
            stats.record_tick(current.alive_count());
            match state {
                RunState::Running => {}
                RunState::Finished(Termination::Cancelled) => {
                    info!(generation, tick = current.tick(), "Viewer stopped");
                    return Ok(());
                }
                RunState::Finished(_) => {
                    stats.record_generation(&current.outcome().fitness);
                    generation += 1;
                    current = runner.start(
                        generation,
                        random_population(args.population, args.hidden, &mut rng),
                    );
                    break;
                }
            }
        }

        // A raised signal only lands on the next step, even while paused.
        if ui_state.paused && runner.stop_signal().is_raised() {
            ui_state.step_requested = true;
        }

        let snapshot = current.snapshot();
        renderer::draw(&texture, &snapshot, ui_state.show_rays);

        let status = StatusLine {
            generation,
            tick: snapshot.tick,
            tick_budget,
            alive: snapshot.alive,
            population: args.population,
            best_fitness: current
                .agents()
                .iter()
                .map(|a| a.fitness)
                .fold(0.0f32, f32::max),
        };
        ui::draw_ui(&mut ui_state, &status, &stats);

        next_frame().await;
    }
}
