use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use threatmap::config::{parse_window_width, EngineConfig, JitterSeedStrategy};
use threatmap::geo::places::StaticPlaceTable;
use threatmap::geo::traits::PlaceLookup;
use threatmap::pipeline::watch;
use threatmap::pipeline::Engine;

/// threatmap: threat scoring, geo clustering and surge detection.
///
/// Reads a JSON or JSONL dataset of threat observations and reports
/// per-event scores, map clusters, a surge-flagged timeline and ranked
/// preemptive-action insights.
#[derive(Parser)]
#[command(name = "threatmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a dataset once
    Analyze {
        /// JSON array or JSONL file of event records
        path: PathBuf,

        /// Print the full report as JSON instead of the terminal summary
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Re-analyze whenever the dataset file changes (Ctrl-C to stop)
    Watch {
        path: PathBuf,

        /// Polling interval in seconds (default: 2)
        #[arg(long, default_value = "2")]
        interval: u64,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// List the built-in place table, or resolve one name against it
    Places {
        /// A location string to resolve (e.g. "Bombay, India")
        #[arg(long)]
        resolve: Option<String>,
    },

    /// Show the effective configuration (defaults + environment + flags)
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Command-line overrides, applied on top of THREATMAP_* variables.
#[derive(Args, Default)]
struct Overrides {
    /// Timeline bucket width, e.g. 1h, 90m, 1d
    #[arg(long)]
    window: Option<String>,

    /// Surge when a bucket exceeds this multiple of its trailing average
    #[arg(long)]
    surge_multiplier: Option<f64>,

    /// Number of preceding buckets in the trailing average
    #[arg(long)]
    trailing: Option<usize>,

    /// Score at or above which an event is High
    #[arg(long)]
    high_threshold: Option<f64>,

    /// Score at or above which an event is Medium
    #[arg(long)]
    medium_threshold: Option<f64>,

    /// Maximum jitter offset in degrees
    #[arg(long)]
    jitter_radius: Option<f64>,

    /// Jitter seed input: event_id or event_id_and_key
    #[arg(long)]
    jitter_seed: Option<String>,

    /// Maximum number of ranked insights
    #[arg(long)]
    max_insights: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut EngineConfig) -> Result<()> {
        if let Some(window) = &self.window {
            let Some(width) = parse_window_width(window) else {
                bail!("invalid --window '{window}' (expected e.g. 30m, 1h, 1d)");
            };
            config.timeline.window_width_secs = width.num_seconds();
        }
        if let Some(v) = self.surge_multiplier {
            config.timeline.surge_multiplier = v;
        }
        if let Some(v) = self.trailing {
            config.timeline.surge_trailing_buckets = v;
        }
        if let Some(v) = self.high_threshold {
            config.thresholds.high = v;
        }
        if let Some(v) = self.medium_threshold {
            config.thresholds.medium = v;
        }
        if let Some(v) = self.jitter_radius {
            config.geo.jitter_radius = v;
        }
        if let Some(seed) = &self.jitter_seed {
            let Ok(strategy) = seed.parse::<JitterSeedStrategy>() else {
                bail!("invalid --jitter-seed '{seed}' (expected event_id or event_id_and_key)");
            };
            config.geo.jitter_seed_strategy = strategy;
        }
        if let Some(v) = self.max_insights {
            config.insights.max_insights = v;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("threatmap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            json,
            out,
            overrides,
        } => {
            let engine = build_engine(&overrides)?;
            let dataset = load(&path)?;
            let report = engine.run(&dataset)?;

            if json {
                println!("{}", threatmap::output::json::to_json(&report)?);
            } else {
                threatmap::output::terminal::display_report(&report);
            }

            if let Some(out) = out {
                threatmap::output::json::write_report(&report, &out)?;
                if !json {
                    println!(
                        "\n{}",
                        format!("JSON report saved to: {}", out.display()).bold()
                    );
                }
            }
        }

        Commands::Watch {
            path,
            interval,
            overrides,
        } => {
            if interval == 0 {
                bail!("--interval must be at least 1 second");
            }
            let engine = Arc::new(build_engine(&overrides)?);
            println!(
                "Watching {} every {}s (Ctrl-C to stop)...",
                path.display(),
                interval
            );

            watch::watch(
                engine,
                path,
                Duration::from_secs(interval),
                |generation, report| {
                    println!(
                        "\n{}",
                        format!("--- Recompute #{generation} ---").dimmed()
                    );
                    threatmap::output::terminal::display_report(report);
                },
            )
            .await?;
        }

        Commands::Places { resolve } => {
            let table = StaticPlaceTable::default();
            match resolve {
                Some(name) => match table.resolve(&name) {
                    Some(place) => println!(
                        "{} -> {} ({:.4}, {:.4})",
                        name, place.name, place.latitude, place.longitude
                    ),
                    None => println!("{} '{}' is not a known place", "Unresolved:".yellow(), name),
                },
                None => threatmap::output::terminal::display_places(&table),
            }
        }

        Commands::Config { overrides } => {
            let config = effective_config(&overrides)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            match config.validate() {
                Ok(()) => println!("\n{}", "Configuration is valid.".green()),
                Err(e) => println!("\n{} {}", "Invalid configuration:".red().bold(), e),
            }
        }
    }

    Ok(())
}

/// Defaults, then THREATMAP_* variables, then command-line flags.
fn effective_config(overrides: &Overrides) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    overrides.apply(&mut config)?;
    Ok(config)
}

fn build_engine(overrides: &Overrides) -> Result<Engine> {
    let config = effective_config(overrides)?;
    let engine = Engine::with_default_places(config).context("invalid configuration")?;
    info!(
        window_secs = engine.config().timeline.window_width_secs,
        surge_multiplier = engine.config().timeline.surge_multiplier,
        "Engine ready"
    );
    Ok(engine)
}

fn load(path: &Path) -> Result<threatmap::ingest::Dataset> {
    let dataset = threatmap::ingest::load_dataset(path)?;
    if dataset.is_empty() {
        warn!(path = %path.display(), "Dataset is empty");
    }
    Ok(dataset)
}
