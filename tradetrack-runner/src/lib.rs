//! TradeTrack Runner — performance aggregation, batch runs, artifacts.
//!
//! This crate builds on `tradetrack-core` to provide:
//! - Bar loading from CSV with per-instrument failure isolation
//! - Per-instrument and global performance summaries with composite scoring
//! - Rolling "as of this trade" snapshots for the trade-detail table
//! - Parallel batch runs over many instruments
//! - CSV / JSON / Markdown artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod ratio;
pub mod scoring;
pub mod snapshot;
pub mod stats;
pub mod summary;

pub use batch::{run_batch, BatchReport, FailureStage, InstrumentFailure, InstrumentSummary};
pub use config::{ConfigError, RunConfig, RunSection};
pub use data_loader::{
    dataset_hash, generate_synthetic_bars, load_bars_csv, load_bars_from_reader, BarLoadError,
    InstrumentSeries, LoadError, LoadedBars,
};
pub use export::{save_artifacts, RunManifest, SCHEMA_VERSION};
pub use ratio::Ratio;
pub use scoring::{CompositeScore, PerformanceCategory, ScoringError, ScoringProfile};
pub use snapshot::{rolling_snapshots, TradeDetail, TradeSnapshot};
pub use summary::PerformanceSummary;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_summary_is_send_sync() {
        assert_send::<PerformanceSummary>();
        assert_sync::<PerformanceSummary>();
    }

    #[test]
    fn scoring_profile_is_send_sync() {
        assert_send::<ScoringProfile>();
        assert_sync::<ScoringProfile>();
    }

    #[test]
    fn instrument_series_is_send_sync() {
        assert_send::<InstrumentSeries>();
        assert_sync::<InstrumentSeries>();
    }

    #[test]
    fn batch_report_is_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<RunManifest>();
        assert_sync::<RunManifest>();
    }
}
