//! TradeTrack CLI — replay signal bars and score the resulting trades.
//!
//! Commands:
//! - `run` — load a bar CSV, replay every instrument, print and save summaries
//! - `synth` — write deterministic synthetic signal bars to CSV
//! - `profile` — print the default scoring profile as TOML
//! - `inspect` — print the manifest of a saved run

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tradetrack_runner::export::{export_bars_csv, load_manifest};
use tradetrack_runner::{
    dataset_hash, generate_synthetic_bars, load_bars_csv, run_batch, save_artifacts, BatchReport,
    PerformanceSummary, RunConfig, RunManifest, ScoringProfile,
};

#[derive(Parser)]
#[command(
    name = "tradetrack",
    about = "TradeTrack CLI — position replay and performance scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a bar CSV and score every instrument.
    Run {
        /// Bar CSV (instrument_id, date, status, close, ...). Overrides `[run] input`.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts. Overrides `[run] output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Process instruments one at a time instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Only run these instruments (repeatable).
        #[arg(long = "instrument")]
        instruments: Vec<String>,

        /// Print results without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Write synthetic signal bars to CSV.
    Synth {
        /// Instrument ids to generate (e.g., TCS INFY).
        #[arg(long = "instrument", required = true)]
        instruments: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 2 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the default scoring profile as TOML.
    Profile,
    /// Print the manifest of a saved run directory.
    Inspect {
        /// Artifact directory containing manifest.json.
        run_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            output_dir,
            sequential,
            instruments,
            no_save,
        } => run_cmd(input, config, output_dir, sequential, instruments, no_save),
        Commands::Synth {
            instruments,
            start,
            end,
            output,
        } => run_synth(&instruments, start, end, &output),
        Commands::Profile => run_profile(),
        Commands::Inspect { run_dir } => run_inspect(&run_dir),
    }
}

fn run_cmd(
    input: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    sequential: bool,
    instruments: Vec<String>,
    no_save: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    // CLI flags win over the config file
    if let Some(input) = input {
        config.run.input = Some(input);
    }
    if let Some(dir) = output_dir {
        config.run.output_dir = dir;
    }
    if sequential {
        config.run.parallel = false;
    }
    if !instruments.is_empty() {
        config.run.instruments = Some(instruments);
    }

    let input = config
        .run
        .input
        .clone()
        .context("no input CSV: pass --input or set [run] input in the config")?;

    let mut loaded = load_bars_csv(&input)?;
    if let Some(allow) = &config.run.instruments {
        loaded.retain_instruments(allow);
    }
    info!(
        input = %input.display(),
        instruments = loaded.series.len(),
        rejected = loaded.rejected.len(),
        bars = loaded.bar_count(),
        "bars loaded"
    );

    let report = run_batch(&loaded.series, &config.scoring, config.run.parallel)
        .with_load_failures(&loaded.rejected);

    print_summary(&report);

    if !no_save {
        let manifest = RunManifest::new(
            &report,
            &config.scoring,
            dataset_hash(&loaded.series),
            loaded.bar_count(),
        )
        .with_input(&input);
        let run_dir = save_artifacts(&report, &manifest, &config.run.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!(
        "{:<14} {:>6} {:>8} {:>10} {:>8} {:>8} {:>7}  {:<10}",
        "Instrument", "Trades", "Win %", "P&L %", "PF", "DD %", "Score", "Category"
    );
    println!("{}", "-".repeat(80));
    for s in &report.summaries {
        print_row(&s.instrument_id, &s.summary);
    }
    println!("{}", "-".repeat(80));
    print_row("GLOBAL", &report.global);

    if !report.failures.is_empty() {
        println!();
        println!("Skipped {} instrument(s):", report.failed());
        for f in &report.failures {
            println!("  {:<14} {:?}: {}", f.instrument_id, f.stage, f.error);
        }
    }
    println!();
}

fn print_row(label: &str, s: &PerformanceSummary) {
    println!(
        "{:<14} {:>6} {:>8.1} {:>10.2} {:>8} {:>8.2} {:>7.1}  {:<10}",
        label,
        s.total_trades,
        s.win_rate,
        s.total_pnl,
        format!("{:.2}", s.profit_factor),
        s.portfolio_drawdown,
        s.composite_score,
        s.performance_category.as_str(),
    );
}

fn run_synth(
    instruments: &[String],
    start: Option<String>,
    end: Option<String>,
    output: &Path,
) -> Result<()> {
    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 2));

    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let bars: Vec<_> = instruments
        .iter()
        .flat_map(|id| generate_synthetic_bars(id, start_date, end_date))
        .collect();

    let csv = export_bars_csv(&bars)?;
    std::fs::write(output, csv)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote {} bars for {} instrument(s) to {}",
        bars.len(),
        instruments.len(),
        output.display()
    );
    Ok(())
}

fn run_profile() -> Result<()> {
    let profile = toml::Value::try_from(ScoringProfile::default())
        .context("failed to serialize scoring profile")?;
    let mut doc = toml::Table::new();
    doc.insert("scoring".to_string(), profile);
    print!("{}", toml::to_string_pretty(&doc)?);
    Ok(())
}

fn run_inspect(run_dir: &Path) -> Result<()> {
    let manifest = load_manifest(run_dir)?;
    println!("Run: {}", run_dir.display());
    println!("Created: {}", manifest.created_at);
    if let Some(input) = &manifest.input {
        println!("Input: {}", input.display());
    }
    println!("Dataset hash: {}", manifest.dataset_hash);
    println!(
        "Instruments: {} succeeded, {} failed",
        manifest.succeeded, manifest.failed
    );
    let g = &manifest.global;
    println!(
        "Global: {} trades, win rate {:.1}%, score {:.1} ({})",
        g.total_trades, g.win_rate, g.composite_score, g.performance_category
    );
    for f in &manifest.failures {
        println!("  skipped {} ({:?}): {}", f.instrument_id, f.stage, f.error);
    }
    Ok(())
}
