//! imetrics - Web-traffic impact of TV and radio spots

mod cli;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use imetrics_core::analytics::analyze_minute_by_minute;
use imetrics_core::{
    analyze_campaign, analyze_spot, build_baseline, ingest, AnalysisConfig, Metric, MetricSample,
    Spot,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "imetrics",
    version,
    about = "Measure the web-traffic impact of TV and radio spots",
    long_about = "Builds a baseline from historically comparable traffic (same weekday ±1,\n\
                  same hour ±2), compares four post-spot windows against it, and reports\n\
                  significant changes, insights and an ROI estimate.\n\
                  \n\
                  Examples:\n\
                    imetrics analyze --samples ga.json --spot '2024-03-05 19:00' --cost 500\n\
                    imetrics baseline --samples ga.json --spot '2024-03-05 19:00'\n\
                    imetrics minute --samples ga.json --spot '2024-03-05 19:00' --metric activeUsers\n\
                    imetrics campaign --samples ga.json --spots spots.json --json\n\
                    imetrics config                  # Print effective configuration\n\
                  \n\
                  Environment Variables:\n\
                    IMETRICS_CONFIG                  # Config file (default: <config_dir>/imetrics/config.toml)\n\
                    IMETRICS_FORMAT                  # Force output format: json|table\n\
                    IMETRICS_NO_COLOR                # Disable ANSI colors (log-friendly)\n\
                    RUST_LOG                         # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the analysis config file
    #[arg(long, global = true, env = "IMETRICS_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Force output format (json|table)
    #[arg(long, global = true, env = "IMETRICS_FORMAT", value_parser = ["json", "table"])]
    format: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "IMETRICS_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Full analysis of one spot: impact per window, insights, ROI
    Analyze {
        /// Sample file (JSON array of GA-style records)
        #[arg(long, short = 's')]
        samples: PathBuf,
        /// Separate history file (default: samples before the spot)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Air time, e.g. "2024-03-05 19:00" or RFC 3339
        #[arg(long)]
        spot: String,
        /// Spot cost
        #[arg(long, default_value = "0")]
        cost: f64,
        /// Spot duration in seconds
        #[arg(long, default_value = "0")]
        duration: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the historical baseline for a spot time
    Baseline {
        #[arg(long, short = 's')]
        samples: PathBuf,
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long)]
        spot: String,
        #[arg(long)]
        json: bool,
    },
    /// Minute-by-minute traffic around air time
    Minute {
        #[arg(long, short = 's')]
        samples: PathBuf,
        #[arg(long)]
        spot: String,
        /// Metric to follow (activeUsers, sessions, pageviews, ...)
        #[arg(long, short = 'm', default_value = "activeUsers")]
        metric: String,
        /// Spot duration in seconds (extends the after-range)
        #[arg(long, default_value = "0")]
        duration: u32,
        #[arg(long)]
        json: bool,
    },
    /// Analyze every spot in a spot list
    Campaign {
        #[arg(long, short = 's')]
        samples: PathBuf,
        #[arg(long)]
        history: Option<PathBuf>,
        /// Spot list (JSON array of {dateTime, durationSeconds, cost, label})
        #[arg(long)]
        spots: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let force_json = cli.format.as_deref() == Some("json");
    let no_color = cli.no_color;

    match cli.command {
        Command::Analyze {
            samples,
            history,
            spot,
            cost,
            duration,
            json,
        } => {
            let spot = parse_spot(&spot)?.with_cost(cost).with_duration(duration);
            run_analyze(&config, &samples, history.as_deref(), spot, json || force_json, no_color)?;
        }
        Command::Baseline {
            samples,
            history,
            spot,
            json,
        } => {
            let spot = parse_spot(&spot)?;
            run_baseline(&config, &samples, history.as_deref(), spot, json || force_json, no_color)?;
        }
        Command::Minute {
            samples,
            spot,
            metric,
            duration,
            json,
        } => {
            let spot = parse_spot(&spot)?.with_duration(duration);
            let metric: Metric = metric
                .parse()
                .with_context(|| format!("Unknown metric '{}'", metric))?;
            run_minute(&config, &samples, spot, metric, json || force_json, no_color)?;
        }
        Command::Campaign {
            samples,
            history,
            spots,
            json,
        } => {
            run_campaign(&config, &samples, history.as_deref(), &spots, json || force_json, no_color)?;
        }
        Command::Config => {
            let text = config
                .to_toml_string()
                .context("Failed to serialize configuration")?;
            print!("{}", text);
        }
    }

    Ok(())
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Explicit path must load; the default location may be absent
fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(AnalysisConfig::default_path()
            .map(|p| AnalysisConfig::load_or_default(&p))
            .unwrap_or_default()),
    }
}

fn parse_spot(raw: &str) -> Result<Spot> {
    Spot::parse(raw).with_context(|| format!("Invalid --spot value '{}'", raw))
}

fn read_samples(path: &Path) -> Result<Vec<MetricSample>> {
    let (samples, report) = ingest::load_samples(path)
        .with_context(|| format!("Failed to load samples: {}", path.display()))?;

    if let Some(warnings) = cli::format_load_warnings(&report) {
        eprintln!("{}", warnings);
    }
    if samples.is_empty() {
        bail!("No usable samples in {}", path.display());
    }
    Ok(samples)
}

fn read_inputs(
    samples: &Path,
    history: Option<&Path>,
    cutoff: chrono::NaiveDateTime,
) -> Result<(Vec<MetricSample>, Vec<MetricSample>)> {
    let samples = read_samples(samples)?;
    let history = history.map(read_samples).transpose()?;
    Ok(cli::split_history(samples, history, cutoff))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", text);
    Ok(())
}

// ============================================================================
// Command Handlers
// ============================================================================

fn run_analyze(
    config: &AnalysisConfig,
    samples: &Path,
    history: Option<&Path>,
    spot: Spot,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let (historical, actual) = read_inputs(samples, history, spot.air_time)?;
    let analysis = analyze_spot(&spot, &historical, &actual, config)
        .with_context(|| format!("Failed to analyze spot at {}", spot.air_time))?;

    if json {
        return print_json(&analysis);
    }

    println!("{}", cli::format_analysis(&analysis, no_color));
    Ok(())
}

fn run_baseline(
    config: &AnalysisConfig,
    samples: &Path,
    history: Option<&Path>,
    spot: Spot,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let (historical, _) = read_inputs(samples, history, spot.air_time)?;
    let baseline = build_baseline(spot.air_time, &historical, config);

    if json {
        return print_json(&baseline);
    }

    println!("{}", cli::format_baseline(&baseline, no_color));
    Ok(())
}

fn run_minute(
    config: &AnalysisConfig,
    samples: &Path,
    spot: Spot,
    metric: Metric,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let samples = read_samples(samples)?;
    let analysis = analyze_minute_by_minute(&spot, &samples, metric, config);

    if json {
        return print_json(&analysis);
    }

    println!("{}", cli::format_minute(&analysis, no_color));
    Ok(())
}

fn run_campaign(
    config: &AnalysisConfig,
    samples: &Path,
    history: Option<&Path>,
    spots_path: &Path,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let (spots, report) = ingest::load_spots(spots_path)
        .with_context(|| format!("Failed to load spots: {}", spots_path.display()))?;
    if let Some(warnings) = cli::format_load_warnings(&report) {
        eprintln!("{}", warnings);
    }

    let Some(first_air) = spots.iter().map(|s| s.air_time).min() else {
        bail!("No valid spots in {}", spots_path.display());
    };

    let (historical, actual) = read_inputs(samples, history, first_air)?;
    let summary = analyze_campaign(&spots, &historical, &actual, config)
        .context("Failed to analyze campaign")?;

    if json {
        return print_json(&summary);
    }

    println!("{}", cli::format_campaign(&summary, no_color));
    Ok(())
}
