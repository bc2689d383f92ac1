//! Integration tests for the CSV → batch → artifacts pipeline.

use std::io::Write;

use tradetrack_runner::export::{export_summaries_csv, load_manifest};
use tradetrack_runner::{
    dataset_hash, load_bars_csv, run_batch, save_artifacts, FailureStage, Ratio, RunConfig,
    RunManifest, ScoringProfile,
};

const SIGNALS: &str = "\
instrument_id,date,status,open,high,low,close,volume,stop_loss,trade_summary
AXISBANK,2024-01-01,ENTRY_LONG,100,101,99,100,1000,95,breakout
AXISBANK,2024-01-02,HOLD,100,105,99,104,1000,,
AXISBANK,2024-01-03,EXIT_LONG,104,105,103,104,1000,,target
AXISBANK,2024-01-04,ENTRY_LONG,100,101,99,100,1000,95,
AXISBANK,2024-01-05,EXIT_LONG,100,107,100,106,1000,,
AXISBANK,2024-01-08,ENTRY_LONG,100,101,99,100,1000,95,
AXISBANK,2024-01-09,EXIT_LONG,100,103,100,102,1000,,
ONGC,2024-01-01,ENTRY_LONG,200,201,199,200,500,190,
ONGC,2024-01-02,EXIT_LONG,200,200,193,194,500,,stop
ONGC,2024-01-03,ENTRY_LONG,200,201,199,200,500,190,
ONGC,2024-01-04,EXIT_LONG,200,200,189,190,500,,stop
COALINDIA,2024-01-01,ENTRY_LONG,300,301,299,300,800,,
COALINDIA,2024-01-02,HOLD,300,301,299,nan,800,,
BADDATE,not-a-date,ENTRY_LONG,1,1,1,1,1,,
DRREDDY,2024-01-01,ENTRY_LONG,500,501,499,500,300,,
DRREDDY,2024-01-02,HOLD,500,506,499,505,300,,
DRREDDY,2024-01-02,EXIT_LONG,505,511,504,510,300,,
";

fn write_signals() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SIGNALS.as_bytes()).unwrap();
    file
}

#[test]
fn pipeline_isolates_failures_and_pools_global() {
    let file = write_signals();
    let loaded = load_bars_csv(file.path()).unwrap();
    assert_eq!(loaded.rejected.len(), 1);
    assert_eq!(loaded.rejected[0].0, "BADDATE");

    let profile = ScoringProfile::default();
    let report = run_batch(&loaded.series, &profile, true).with_load_failures(&loaded.rejected);

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 3);
    let failed: Vec<(&str, FailureStage)> = report
        .failures
        .iter()
        .map(|f| (f.instrument_id.as_str(), f.stage))
        .collect();
    assert_eq!(
        failed,
        [
            ("BADDATE", FailureStage::Load),
            ("COALINDIA", FailureStage::Replay),
            ("DRREDDY", FailureStage::Replay),
        ]
    );

    // AXISBANK wins 4%, 6%, 2%; ONGC loses 3%, 5%
    let axis = &report.summaries[0].summary;
    let ongc = &report.summaries[1].summary;
    assert_eq!(axis.profit_factor, Ratio::Unbounded);
    assert_eq!(ongc.profit_factor, Ratio::Defined(0.0));

    let pf = report.global.profit_factor.value().unwrap();
    assert!((pf - 12.0 / 8.0).abs() < 1e-9);
    assert_eq!(report.global.total_trades, 5);
    assert!((report.global.win_rate - 60.0).abs() < 1e-9);
}

#[test]
fn duplicate_date_fails_only_that_instrument() {
    let file = write_signals();
    let loaded = load_bars_csv(file.path()).unwrap();

    // The loader keeps both rows for the repeated date
    let drreddy = loaded
        .series
        .iter()
        .find(|s| s.instrument_id == "DRREDDY")
        .unwrap();
    assert_eq!(drreddy.bars.len(), 3);

    let report = run_batch(&loaded.series, &ScoringProfile::default(), false);
    let failure = report
        .failures
        .iter()
        .find(|f| f.instrument_id == "DRREDDY")
        .unwrap();
    assert_eq!(failure.stage, FailureStage::Replay);
    assert!(failure.error.contains("not strictly increasing"));

    let ids: Vec<&str> = report
        .summaries
        .iter()
        .map(|s| s.instrument_id.as_str())
        .collect();
    assert_eq!(ids, ["AXISBANK", "ONGC"]);
}

#[test]
fn trade_details_carry_window_stats() {
    let file = write_signals();
    let loaded = load_bars_csv(file.path()).unwrap();
    let report = run_batch(&loaded.series, &ScoringProfile::default(), false);

    let first = &report.trades[0].trade;
    assert_eq!(first.instrument_id, "AXISBANK");
    assert_eq!(first.entry_stop_loss, Some(95.0));
    assert_eq!(first.entry_summary.as_deref(), Some("breakout"));
    assert_eq!(first.exit_summary.as_deref(), Some("target"));
    assert_eq!(first.days_held, 3);
    assert!((first.high_water_mark - 104.0).abs() < 1e-9);
}

#[test]
fn artifacts_are_written_and_reloadable() {
    let file = write_signals();
    let loaded = load_bars_csv(file.path()).unwrap();
    let profile = ScoringProfile::default();
    let report = run_batch(&loaded.series, &profile, false).with_load_failures(&loaded.rejected);

    let manifest = RunManifest::new(
        &report,
        &profile,
        dataset_hash(&loaded.series),
        loaded.bar_count(),
    )
    .with_input(file.path());

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, &manifest, out.path()).unwrap();

    let back = load_manifest(&run_dir).unwrap();
    assert_eq!(back.failed, 3);
    assert_eq!(back.dataset_hash, manifest.dataset_hash);
    assert_eq!(back.failures, report.failures);

    let summary_csv = std::fs::read_to_string(run_dir.join("summary.csv")).unwrap();
    assert_eq!(
        summary_csv,
        export_summaries_csv(&report.summaries, &report.global).unwrap()
    );
    assert!(summary_csv.lines().last().unwrap().starts_with("__GLOBAL__,5,"));
}

#[test]
fn config_allow_list_restricts_instruments() {
    let file = write_signals();
    let config = RunConfig::from_toml_str("[run]\ninstruments = [\"ONGC\"]\n").unwrap();

    let mut loaded = load_bars_csv(file.path()).unwrap();
    if let Some(allow) = &config.run.instruments {
        loaded.retain_instruments(allow);
    }
    let report = run_batch(&loaded.series, &config.scoring, config.run.parallel);

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.summaries[0].instrument_id, "ONGC");
    assert!(loaded.rejected.is_empty());
}

#[test]
fn dataset_hash_is_stable_across_loads() {
    let file = write_signals();
    let a = load_bars_csv(file.path()).unwrap();
    let b = load_bars_csv(file.path()).unwrap();
    assert_eq!(dataset_hash(&a.series), dataset_hash(&b.series));
}
