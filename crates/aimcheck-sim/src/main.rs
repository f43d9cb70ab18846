mod autoplay;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use aimcheck_engine::{ChallengeConfig, ChallengeKind};

use autoplay::{PlayStyle, RunSummary, play};

#[derive(Parser, Debug)]
#[command(name = "aimcheck-sim")]
#[command(about = "Play aimcheck challenges headlessly with a scripted autoplayer")]
struct Cli {
    /// Challenge preset; without it (and without --config) the configuration
    /// comes from $AIMCHECK_CONFIG or config/aimcheck.toml
    #[arg(long, value_enum, conflicts_with = "config")]
    kind: Option<CliKind>,
    /// TOML challenge configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of challenges to play
    #[arg(long, default_value_t = 1)]
    runs: u32,
    /// Seed of the first run; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Probability that the autoplayer's action is correct
    #[arg(long, default_value_t = 0.9)]
    accuracy: f64,
    /// Logical frame length in ms
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Minimum delay between autoplayer actions in ms
    #[arg(long, default_value_t = 250)]
    reaction_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliKind {
    Gallery,
    Bot,
    Sequence,
}

impl From<CliKind> for ChallengeKind {
    fn from(kind: CliKind) -> Self {
        match kind {
            CliKind::Gallery => ChallengeKind::Gallery,
            CliKind::Bot => ChallengeKind::Bot,
            CliKind::Sequence => ChallengeKind::Sequence,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if !(0.0..=1.0).contains(&cli.accuracy) {
        bail!("--accuracy must be within [0, 1], got {}", cli.accuracy);
    }

    let config = match (&cli.config, cli.kind) {
        (Some(path), _) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ChallengeConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        },
        (None, Some(kind)) => ChallengeConfig::for_kind(kind.into()),
        (None, None) => ChallengeConfig::load(),
    };
    let style = PlayStyle {
        accuracy: cli.accuracy,
        frame_ms: cli.frame_ms,
        reaction_ms: cli.reaction_ms,
    };

    tracing::info!(kind = %config.kind, runs = cli.runs, seed = cli.seed, "Starting simulation");
    let summaries = (0..cli.runs)
        .map(|run| play(&config, run, cli.seed.wrapping_add(u64::from(run)), style))
        .collect::<Result<Vec<RunSummary>>>()?;

    let wins = summaries
        .iter()
        .filter(|s| s.token.is_some())
        .count();
    tracing::info!(wins, runs = cli.runs, "Simulation finished");

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
