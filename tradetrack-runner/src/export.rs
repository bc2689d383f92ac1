//! Reporting and export — CSV tables, JSON manifest and Markdown report.
//!
//! Artifacts of one batch run:
//! - **trades.csv**: trade-detail table with the rolling snapshot columns
//! - **summary.csv**: one row per instrument plus a `__GLOBAL__` row
//! - **manifest.json**: run metadata with schema versioning
//! - **report.md**: human-readable summary
//!
//! The manifest carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tradetrack_core::Bar;

use crate::batch::{BatchReport, InstrumentFailure, InstrumentSummary};
use crate::scoring::ScoringProfile;
use crate::snapshot::TradeDetail;
use crate::summary::PerformanceSummary;

pub const SCHEMA_VERSION: u32 = 1;

/// Instrument id used for the pooled row of `summary.csv`.
pub const GLOBAL_ROW_ID: &str = "__GLOBAL__";

// ─── Manifest ───────────────────────────────────────────────────────

/// Metadata for one batch run, persisted as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub created_at: String,
    pub input: Option<PathBuf>,
    pub dataset_hash: String,
    pub bar_count: usize,
    pub profile: ScoringProfile,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<InstrumentFailure>,
    pub global: PerformanceSummary,
}

impl RunManifest {
    pub fn new(
        report: &BatchReport,
        profile: &ScoringProfile,
        dataset_hash: impl Into<String>,
        bar_count: usize,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Local::now().to_rfc3339(),
            input: None,
            dataset_hash: dataset_hash.into(),
            bar_count,
            profile: profile.clone(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            failures: report.failures.clone(),
            global: report.global.clone(),
        }
    }

    pub fn with_input(mut self, input: &Path) -> Self {
        self.input = Some(input.to_path_buf());
        self
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunManifest` to pretty JSON.
pub fn export_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize RunManifest to JSON")
}

/// Deserialize a `RunManifest` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize RunManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt_price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Shortest representation that parses back to the same `f64`.
fn opt_exact(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export the trade-detail table.
///
/// Columns: instrument_id, status, entry_date, entry_price, entry_stop_loss,
/// entry_summary, exit_date, exit_price, exit_stop_loss, exit_summary,
/// last_date, last_close, pnl_pct, absolute_pl, day_return,
/// annualized_return, days_held, high_water_mark, price_range_pct,
/// price_range_drawdown, then the rolling snapshot: trades_so_far, win_rate,
/// profit_factor, win_loss_ratio, portfolio_drawdown, recovery_factor,
/// sharpe_ratio, sortino_ratio, trade_confidence, composite_score,
/// performance_category, confidence
pub fn export_trades_csv(details: &[TradeDetail]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "instrument_id",
        "status",
        "entry_date",
        "entry_price",
        "entry_stop_loss",
        "entry_summary",
        "exit_date",
        "exit_price",
        "exit_stop_loss",
        "exit_summary",
        "last_date",
        "last_close",
        "pnl_pct",
        "absolute_pl",
        "day_return",
        "annualized_return",
        "days_held",
        "high_water_mark",
        "price_range_pct",
        "price_range_drawdown",
        "trades_so_far",
        "win_rate",
        "profit_factor",
        "win_loss_ratio",
        "portfolio_drawdown",
        "recovery_factor",
        "sharpe_ratio",
        "sortino_ratio",
        "trade_confidence",
        "composite_score",
        "performance_category",
        "confidence",
    ])?;

    for d in details {
        let snap = &d.snapshot;
        let t = &d.trade;
        wtr.write_record([
            t.instrument_id.as_str(),
            t.status.as_str(),
            &t.entry_date.to_string(),
            &format!("{:.2}", t.entry_price),
            &opt_price(t.entry_stop_loss),
            t.entry_summary.as_deref().unwrap_or(""),
            &t.exit_date.map(|d| d.to_string()).unwrap_or_default(),
            &opt_price(t.exit_price),
            &opt_price(t.exit_stop_loss),
            t.exit_summary.as_deref().unwrap_or(""),
            &t.last_date.to_string(),
            &format!("{:.2}", t.last_close),
            &format!("{:.4}", t.pnl_pct),
            &format!("{:.2}", t.absolute_pl),
            &format!("{:.4}", t.day_return),
            &format!("{:.4}", t.annualized_return),
            &t.days_held.to_string(),
            &format!("{:.2}", t.high_water_mark),
            &format!("{:.4}", t.price_range_pct),
            &format!("{:.4}", t.price_range_drawdown),
            &snap.trades_so_far.to_string(),
            &format!("{:.2}", snap.win_rate),
            &format!("{:.4}", snap.profit_factor),
            &format!("{:.4}", snap.win_loss_ratio),
            &format!("{:.4}", snap.portfolio_drawdown),
            &format!("{:.4}", snap.recovery_factor),
            &format!("{:.4}", snap.sharpe_ratio),
            &format!("{:.4}", snap.sortino_ratio),
            &format!("{:.4}", snap.trade_confidence),
            &format!("{:.2}", snap.composite_score),
            snap.performance_category.as_str(),
            &format!("{:.4}", snap.confidence),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn summary_record(instrument_id: &str, s: &PerformanceSummary) -> Vec<String> {
    vec![
        instrument_id.to_string(),
        s.total_trades.to_string(),
        s.winning_trades.to_string(),
        s.losing_trades.to_string(),
        s.open_trades.to_string(),
        format!("{:.2}", s.win_rate),
        format!("{:.4}", s.avg_pnl),
        format!("{:.4}", s.avg_win),
        format!("{:.4}", s.avg_loss),
        format!("{:.4}", s.total_pnl),
        format!("{:.4}", s.best_trade),
        format!("{:.4}", s.worst_trade),
        format!("{:.2}", s.avg_days_held),
        format!("{:.4}", s.win_loss_ratio),
        format!("{:.4}", s.profit_factor),
        format!("{:.4}", s.portfolio_drawdown),
        format!("{:.4}", s.recovery_factor),
        format!("{:.4}", s.sharpe_ratio),
        format!("{:.4}", s.sortino_ratio),
        format!("{:.4}", s.trade_confidence),
        format!("{:.2}", s.composite_score),
        s.performance_category.as_str().to_string(),
        format!("{:.4}", s.confidence),
    ]
}

/// Export per-instrument summaries followed by the global row.
///
/// Unbounded ratios are written as `inf`.
pub fn export_summaries_csv(
    summaries: &[InstrumentSummary],
    global: &PerformanceSummary,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "instrument_id",
        "total_trades",
        "winning_trades",
        "losing_trades",
        "open_trades",
        "win_rate",
        "avg_pnl",
        "avg_win",
        "avg_loss",
        "total_pnl",
        "best_trade",
        "worst_trade",
        "avg_days_held",
        "win_loss_ratio",
        "profit_factor",
        "portfolio_drawdown",
        "recovery_factor",
        "sharpe_ratio",
        "sortino_ratio",
        "trade_confidence",
        "composite_score",
        "performance_category",
        "confidence",
    ])?;

    for s in summaries {
        wtr.write_record(summary_record(&s.instrument_id, &s.summary))?;
    }
    wtr.write_record(summary_record(GLOBAL_ROW_ID, global))?;

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export bars in the layout the loader reads back.
///
/// Prices are written at full precision so a reload replays identically.
pub fn export_bars_csv(bars: &[Bar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "instrument_id",
        "date",
        "status",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "stop_loss",
        "trade_summary",
    ])?;

    for b in bars {
        wtr.write_record([
            b.instrument_id.as_str(),
            &b.date.to_string(),
            b.status.as_deref().unwrap_or(""),
            &opt_exact(b.open),
            &opt_exact(b.high),
            &opt_exact(b.low),
            &opt_exact(b.close),
            &b.volume.map(|v| v.to_string()).unwrap_or_default(),
            &opt_exact(b.stop_loss),
            b.trade_summary.as_deref().unwrap_or(""),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a batch run.
pub fn generate_report(report: &BatchReport, manifest: &RunManifest) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Trade Performance Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let Some(input) = &manifest.input {
        md.push_str(&format!("| Input | {} |\n", input.display()));
    }
    md.push_str(&format!("| Created | {} |\n", manifest.created_at));
    md.push_str(&format!("| Bars | {} |\n", manifest.bar_count));
    md.push_str(&format!(
        "| Instruments | {} succeeded, {} failed |\n",
        manifest.succeeded, manifest.failed
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", manifest.dataset_hash));
    md.push('\n');

    md.push_str("## Instruments\n\n");
    md.push_str("| Instrument | Trades | Win Rate | Total P&L % | Profit Factor | Drawdown % | Score | Category |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | --- |\n");
    let rows = report
        .summaries
        .iter()
        .map(|s| (s.instrument_id.as_str(), &s.summary))
        .chain(std::iter::once((GLOBAL_ROW_ID, &report.global)));
    for (id, s) in rows {
        md.push_str(&format!(
            "| {} | {} | {:.1}% | {:.2} | {:.2} | {:.2} | {:.1} | {} |\n",
            id,
            s.total_trades,
            s.win_rate,
            s.total_pnl,
            s.profit_factor,
            s.portfolio_drawdown,
            s.composite_score,
            s.performance_category,
        ));
    }
    md.push('\n');

    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        for f in &report.failures {
            md.push_str(&format!(
                "- **{}** ({:?}): {}\n",
                f.instrument_id, f.stage, f.error
            ));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a batch run.
///
/// Creates a directory named `run_{timestamp}/` under `output_dir`
/// containing `trades.csv`, `summary.csv`, `manifest.json` and `report.md`.
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    report: &BatchReport,
    manifest: &RunManifest,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!("run_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, contents: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    };

    write("trades.csv", export_trades_csv(&report.trades)?)?;
    write(
        "summary.csv",
        export_summaries_csv(&report.summaries, &report.global)?,
    )?;
    write("manifest.json", export_json(manifest)?)?;
    write("report.md", generate_report(report, manifest))?;

    Ok(run_dir)
}

/// Load a `RunManifest` from an artifact directory.
///
/// Rejects unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
