mod analyze;
mod demo;
mod digest;
mod display;
mod track;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use billwatch_core::{Config, DigestLimits, ScreeningMode};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";
/// Upper bound for the digest's day-count flags.
const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Parser)]
#[command(name = "billwatch", version, about = "Track California housing bills and score their local-control risk")]
struct Cli {
    /// YAML config file [default: ./config.yaml, used only if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch bills, merge them into the store, and report new and changed bills
    Track {
        /// Use built-in sample bills instead of the network
        #[arg(long)]
        demo: bool,

        #[arg(long, env = "LEGISCAN_API_KEY", hide_env_values = true)]
        legiscan_api_key: Option<String>,

        #[arg(long, env = "OPENSTATES_API_KEY", hide_env_values = true)]
        openstates_api_key: Option<String>,
    },
    /// Score stored bills that are unscored or whose status changed
    Analyze {
        /// Re-score every stored bill
        #[arg(long)]
        force: bool,

        /// Score only this bill (e.g. "AB 1234"); takes precedence over --force
        #[arg(long)]
        bill: Option<String>,

        /// Skip scoring and print the current analysis summary
        #[arg(long)]
        summary_only: bool,

        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        anthropic_api_key: Option<String>,
    },
    /// Print the watch list, recently found bills, and upcoming hearings
    Digest {
        /// Bills first seen within this many days count as new
        #[arg(
            long,
            default_value_t = DigestLimits::default().lookback_days,
            value_parser = clap::value_parser!(i64).range(0..=MAX_WINDOW_DAYS)
        )]
        lookback_days: i64,

        /// List hearings within this many days
        #[arg(
            long,
            default_value_t = DigestLimits::default().hearing_lookahead,
            value_parser = clap::value_parser!(i64).range(0..=MAX_WINDOW_DAYS)
        )]
        hearing_lookahead: i64,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("loading config {DEFAULT_CONFIG}")),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Prefer a non-empty value from the command line or environment.
fn override_key(slot: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = value;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.as_deref())?;
    init_tracing(&cfg.logging.level);
    tracing::debug!("billwatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Track {
            demo,
            legiscan_api_key,
            openstates_api_key,
        } => {
            override_key(&mut cfg.data_source.legiscan_api_key, legiscan_api_key);
            override_key(&mut cfg.data_source.openstates_api_key, openstates_api_key);
            track::run(&cfg, demo).await?;
        }
        Command::Analyze {
            force,
            bill,
            summary_only,
            anthropic_api_key,
        } => {
            let mode = ScreeningMode::from_flags(force, bill);
            let api_key = anthropic_api_key.filter(|k| !k.trim().is_empty());
            analyze::run(&cfg, mode, summary_only, api_key.as_deref()).await?;
        }
        Command::Digest {
            lookback_days,
            hearing_lookahead,
        } => {
            let limits = DigestLimits {
                lookback_days,
                hearing_lookahead,
                ..Default::default()
            };
            digest::run(&cfg, &limits)?;
        }
    }

    Ok(())
}
