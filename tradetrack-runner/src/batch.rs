//! Batch runner — replay and aggregate many instruments at once.
//!
//! Each instrument is isolated: a replay failure is recorded in the report
//! and logged, and every other instrument still produces its trades and
//! summary. The global summary pools the trades of all succeeded instruments.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tradetrack_core::{replay, Trade};

use crate::data_loader::{BarLoadError, InstrumentSeries};
use crate::scoring::ScoringProfile;
use crate::snapshot::{rolling_snapshots, TradeDetail};
use crate::summary::PerformanceSummary;

/// Where an instrument dropped out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Load,
    Replay,
}

/// One instrument that produced no output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFailure {
    pub instrument_id: String,
    pub stage: FailureStage,
    pub error: String,
}

/// Final summary of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub instrument_id: String,
    pub summary: PerformanceSummary,
}

/// Everything one batch run produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Trade-detail rows, ordered by instrument id then entry date.
    pub trades: Vec<TradeDetail>,
    /// One summary per succeeded instrument, ordered by instrument id.
    pub summaries: Vec<InstrumentSummary>,
    /// Summary over the union of all succeeded instruments' trades.
    pub global: PerformanceSummary,
    /// Failed instruments, ordered by instrument id.
    pub failures: Vec<InstrumentFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.summaries.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Fold loader rejections into the failure list.
    pub fn with_load_failures(mut self, rejected: &[(String, BarLoadError)]) -> Self {
        self.failures
            .extend(rejected.iter().map(|(instrument_id, e)| InstrumentFailure {
                instrument_id: instrument_id.clone(),
                stage: FailureStage::Load,
                error: e.to_string(),
            }));
        self.failures
            .sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
        self
    }
}

/// Output of one instrument.
struct InstrumentRun {
    summary: InstrumentSummary,
    details: Vec<TradeDetail>,
}

fn run_instrument(
    series: &InstrumentSeries,
    profile: &ScoringProfile,
) -> Result<InstrumentRun, InstrumentFailure> {
    let trades = replay(&series.bars).map_err(|e| InstrumentFailure {
        instrument_id: series.instrument_id.clone(),
        stage: FailureStage::Replay,
        error: e.to_string(),
    })?;

    let summary = PerformanceSummary::compute(&trades, profile);
    debug!(
        instrument = %series.instrument_id,
        bars = series.bars.len(),
        trades = summary.total_trades,
        score = summary.composite_score,
        "instrument replayed"
    );

    Ok(InstrumentRun {
        details: rolling_snapshots(&trades, profile),
        summary: InstrumentSummary {
            instrument_id: series.instrument_id.clone(),
            summary,
        },
    })
}

/// Replay and aggregate every instrument.
///
/// With `parallel` the instruments are spread over the rayon pool. The report
/// is identical either way.
pub fn run_batch(
    instruments: &[InstrumentSeries],
    profile: &ScoringProfile,
    parallel: bool,
) -> BatchReport {
    let results: Vec<Result<InstrumentRun, InstrumentFailure>> = if parallel {
        instruments
            .par_iter()
            .map(|series| run_instrument(series, profile))
            .collect()
    } else {
        instruments
            .iter()
            .map(|series| run_instrument(series, profile))
            .collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(run) => runs.push(run),
            Err(failure) => {
                warn!(
                    instrument = %failure.instrument_id,
                    error = %failure.error,
                    "instrument skipped"
                );
                failures.push(failure);
            }
        }
    }

    runs.sort_by(|a, b| {
        a.summary
            .instrument_id
            .cmp(&b.summary.instrument_id)
    });
    failures.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));

    let mut trades = Vec::new();
    let mut summaries = Vec::with_capacity(runs.len());
    for run in runs {
        trades.extend(run.details);
        summaries.push(run.summary);
    }

    let all_trades: Vec<Trade> = trades.iter().map(|d| d.trade.clone()).collect();
    let global = PerformanceSummary::compute(&all_trades, profile);

    info!(
        succeeded = summaries.len(),
        failed = failures.len(),
        trades = global.total_trades,
        score = global.composite_score,
        category = %global.performance_category,
        "batch complete"
    );

    BatchReport {
        trades,
        summaries,
        global,
        failures,
    }
}
