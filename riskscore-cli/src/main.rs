//! riskscore CLI - scores, validates and summarizes risk and control records

#![deny(warnings)]

// Global invariants enforced:
// - Derived fields always come from the engine, never from the input file
// - Deterministic output ordering
// - A rejection prints `field: message` on stderr and exits with code 1

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use riskscore_core::aggregates::summarize;
use riskscore_core::config::{self, ResolvedConfig};
use riskscore_core::dates::parse_iso_date;
use riskscore_core::report::{
    render_control_text, render_json, render_risk_detail, render_risks_text, render_summary_text,
    sort_scored_risks,
};
use riskscore_core::{
    evaluate_control, score_candidate, validate_control, validate_risk, ControlRecord,
    EngineOptions, RiskRecord, ScoredRisk, Violation,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "RISKSCORE_LOG";
const DEFAULT_LOG_FILTER: &str = "riskscore=warn";

#[derive(Parser)]
#[command(name = "riskscore")]
#[command(about = "Risk & control scoring and compliance rule engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute derived fields for a risk (or a JSON array of risks)
    Score {
        /// Path to risk JSON file
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a submitted record against the consistency rules
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
    },
    /// Compute a control's lifecycle status
    Status {
        /// Path to control JSON file
        path: PathBuf,

        /// Evaluation date (YYYY-MM-DD, overrides config and system date)
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Summarize a portfolio file (`{"risks": [...], "controls": [...]}`)
    Summary {
        /// Path to portfolio JSON file
        path: PathBuf,

        /// Evaluation date (YYYY-MM-DD, overrides config and system date)
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ValidateTarget {
    /// Validate a risk record
    Risk {
        /// Path to risk JSON file
        path: PathBuf,
    },
    /// Validate a control record
    Control {
        /// Path to control JSON file
        path: PathBuf,

        /// Evaluation date (YYYY-MM-DD, overrides config and system date)
        #[arg(long, value_parser = parse_date_arg)]
        today: Option<NaiveDate>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Portfolio input file
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Portfolio {
    risks: Vec<RiskRecord>,
    controls: Vec<ControlRecord>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            path,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let options = resolved.engine_options();
            let risks = read_risks(&path)?;
            let single = risks.len() == 1;

            let scored = match score_all(&risks, &options) {
                Ok(scored) => scored,
                Err(violation) => reject(violation),
            };

            match format {
                OutputFormat::Text if single => print!("{}", render_risk_detail(&scored[0])),
                OutputFormat::Text => print!("{}", render_risks_text(&scored)),
                OutputFormat::Json if single => println!("{}", render_json(&scored[0])),
                OutputFormat::Json => println!("{}", render_json(&scored)),
            }
        }
        Commands::Validate { target } => match target {
            ValidateTarget::Risk { path } => {
                let risk: RiskRecord = read_json(&path)?;
                report_validation(validate_risk(&risk));
            }
            ValidateTarget::Control {
                path,
                today,
                config: config_path,
            } => {
                let resolved = load_config(config_path.as_deref())?;
                let control: ControlRecord = read_json(&path)?;
                report_validation(validate_control(&control, effective_today(today, &resolved)));
            }
        },
        Commands::Status {
            path,
            today,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let control: ControlRecord = read_json(&path)?;
            let status = evaluate_control(&control, effective_today(today, &resolved));

            match format {
                OutputFormat::Text => print!("{}", render_control_text(&control, &status)),
                OutputFormat::Json => println!("{}", render_json(&status)),
            }
        }
        Commands::Summary {
            path,
            today,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let portfolio: Portfolio = read_json(&path)?;
            let summary = summarize(
                &portfolio.risks,
                &portfolio.controls,
                effective_today(today, &resolved),
            );

            match format {
                OutputFormat::Text => print!("{}", render_summary_text(&summary)),
                OutputFormat::Json => println!("{}", render_json(&summary)),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                match config::load_and_resolve(&project_root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("  default_response: {}", resolved.default_response);
                println!(
                    "  evaluation_date: {}",
                    resolved
                        .evaluation_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "system date".to_string())
                );
                println!(
                    "  normalize_control_flags: {}",
                    resolved.normalize_control_flags
                );
            }
        },
    }

    Ok(())
}

/// Install the stderr log subscriber, filtered by `RISKSCORE_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_iso_date(value).ok_or_else(|| format!("expected YYYY-MM-DD, got '{}'", value))
}

/// Load configuration discovered from the current directory (or `config_path`)
fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;

    if let Some(path) = &resolved.config_path {
        eprintln!("Using config: {}", path.display());
    }
    Ok(resolved)
}

/// Evaluation day: `--today`, then the pinned config date, then the system date
fn effective_today(today: Option<NaiveDate>, resolved: &ResolvedConfig) -> NaiveDate {
    let source = if today.is_some() {
        "flag"
    } else if resolved.evaluation_date.is_some() {
        "config"
    } else {
        "system"
    };
    let day = today.unwrap_or_else(|| resolved.today_or(chrono::Local::now().date_naive()));
    tracing::debug!(today = %day, source, "evaluation day resolved");
    day
}

/// Check and score every candidate, sorted for output
///
/// Stops at the first candidate whose inputs are out of domain.
fn score_all(risks: &[RiskRecord], options: &EngineOptions) -> Result<Vec<ScoredRisk>, Violation> {
    let scored = risks
        .iter()
        .map(|risk| score_candidate(risk, options))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = scored.len(), "risks scored");
    Ok(sort_scored_risks(scored))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Read a single risk object or an array of risks
fn read_risks(path: &Path) -> anyhow::Result<Vec<RiskRecord>> {
    let value: Value = read_json(path)?;
    let risks: Vec<RiskRecord> = match value {
        Value::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value(other).map(|risk| vec![risk]),
    }
    .with_context(|| format!("invalid risk record in {}", path.display()))?;

    if risks.is_empty() {
        anyhow::bail!("no risks found in {}", path.display());
    }
    Ok(risks)
}

fn report_validation(result: Result<(), Violation>) {
    match result {
        Ok(()) => println!("ok"),
        Err(violation) => reject(violation),
    }
}

/// Print a rejection as `field: message` and exit 1
fn reject(violation: Violation) -> ! {
    eprintln!("{}", violation);
    std::process::exit(1);
}
