use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use trackrunner::controller::random_population;
use trackrunner::reporting::{GenerationReport, MetricAggregator};
use trackrunner::{GenerationRunner, SimConfig};

#[derive(Parser, Debug)]
#[command(
    name = "trackrunner-eval",
    version,
    about = "Evaluate seeded random populations on a track and emit JSON-lines reports"
)]
struct Cli {
    /// Track image; border pixels are obstacles.
    #[arg(long)]
    track: PathBuf,

    /// Optional JSON file overriding simulation constants.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    generations: u64,

    #[arg(long, default_value_t = 30)]
    population: usize,

    /// Hidden neurons per controller.
    #[arg(long, default_value_t = 8)]
    hidden: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Sweep agents on the rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Override the tick budget from the config.
    #[arg(long)]
    tick_budget: Option<u32>,

    /// Report destination; stdout when omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    config.parallel |= cli.parallel;
    if let Some(budget) = cli.tick_budget {
        config.tick_budget = budget;
    }

    let runner = GenerationRunner::from_track_file(&cli.track, config)
        .with_context(|| format!("loading track {}", cli.track.display()))?;

    let mut out: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let mut best = MetricAggregator::new();
    for generation in 0..cli.generations {
        let controllers = random_population(cli.population, cli.hidden, &mut rng);
        let outcome = runner
            .evaluate(generation, controllers)
            .with_context(|| format!("evaluating generation {generation}"))?;

        let report = GenerationReport::from_outcome(&outcome);
        best.push(report.fitness_summary.max);
        report
            .write_json_line(&mut out)
            .context("writing generation report")?;
    }
    out.flush().context("flushing reports")?;

    let summary = best.summary();
    info!(
        generations = summary.count,
        best = summary.max,
        mean_best = summary.mean,
        "Evaluation complete"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
