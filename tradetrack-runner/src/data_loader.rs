//! Bar loading for the runner.
//!
//! Reads the signal-bar export (one row per instrument and date) and groups
//! it into per-instrument series sorted by date. Failure policy:
//! 1. File cannot be opened or decoded as CSV → fatal `LoadError`
//! 2. A row with an unparseable date or number → that instrument is rejected
//!    with a `BarLoadError`; every other instrument still loads
//! 3. Empty cells and `nan` are treated as missing values
//!
//! Duplicate dates are kept so the replayer can reject the instrument.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use thiserror::Error;
use tradetrack_core::Bar;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fatal errors: nothing could be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open bar file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed bar CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-instrument errors: this instrument is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarLoadError {
    #[error("row {row}: unparseable date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: unparseable {field} '{value}'")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// One instrument's bars, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub instrument_id: String,
    pub bars: Vec<Bar>,
}

/// Result of loading a bar file.
#[derive(Debug, Default)]
pub struct LoadedBars {
    /// Successfully parsed instruments, sorted by id.
    pub series: Vec<InstrumentSeries>,
    /// Instruments whose rows could not be parsed, sorted by id.
    pub rejected: Vec<(String, BarLoadError)>,
}

impl LoadedBars {
    /// Keep only the listed instruments (loaded or rejected).
    pub fn retain_instruments(&mut self, allow: &[String]) {
        self.series.retain(|s| allow.contains(&s.instrument_id));
        self.rejected.retain(|(id, _)| allow.contains(id));
    }

    pub fn bar_count(&self) -> usize {
        self.series.iter().map(|s| s.bars.len()).sum()
    }
}

/// Raw CSV row. Every cell is read as text and converted per instrument so a
/// bad cell only rejects its own instrument.
#[derive(Debug, Deserialize)]
struct BarRow {
    #[serde(alias = "company_code", alias = "symbol")]
    instrument_id: String,
    date: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    open: Option<String>,
    #[serde(default)]
    high: Option<String>,
    #[serde(default)]
    low: Option<String>,
    #[serde(default)]
    close: Option<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    stop_loss: Option<String>,
    #[serde(default)]
    trade_summary: Option<String>,
}

impl BarRow {
    fn into_bar(self, row: usize) -> Result<Bar, BarLoadError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            BarLoadError::InvalidDate {
                row,
                value: self.date.clone(),
            }
        })?;

        Ok(Bar {
            date,
            status: text_cell(self.status),
            open: number_cell(self.open, "open", row)?,
            high: number_cell(self.high, "high", row)?,
            low: number_cell(self.low, "low", row)?,
            close: number_cell(self.close, "close", row)?,
            volume: number_cell(self.volume, "volume", row)?
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64),
            stop_loss: number_cell(self.stop_loss, "stop_loss", row)?,
            trade_summary: text_cell(self.trade_summary),
            instrument_id: self.instrument_id.trim().to_string(),
        })
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null")
}

fn text_cell(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !is_missing(s))
}

fn number_cell(
    cell: Option<String>,
    field: &'static str,
    row: usize,
) -> Result<Option<f64>, BarLoadError> {
    let Some(text) = text_cell(cell) else {
        return Ok(None);
    };
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| BarLoadError::InvalidNumber {
            row,
            field,
            value: text,
        })
}

/// Load and group a bar CSV from disk.
pub fn load_bars_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bars_from_reader(file)
}

/// Load and group bar CSV data from any reader.
pub fn load_bars_from_reader<R: Read>(reader: R) -> Result<LoadedBars, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut grouped: BTreeMap<String, Result<Vec<Bar>, BarLoadError>> = BTreeMap::new();

    for (i, record) in rdr.deserialize::<BarRow>().enumerate() {
        // Header is line 1, first data row is line 2.
        let row_number = i + 2;
        let row = record?;
        let instrument_id = row.instrument_id.trim().to_string();
        let entry = grouped
            .entry(instrument_id)
            .or_insert_with(|| Ok(Vec::new()));

        // First error wins; later rows of a rejected instrument are skipped.
        if entry.is_err() {
            continue;
        }
        match row.into_bar(row_number) {
            Ok(bar) => {
                if let Ok(bars) = entry {
                    bars.push(bar);
                }
            }
            Err(e) => *entry = Err(e),
        }
    }

    let mut loaded = LoadedBars::default();
    for (instrument_id, result) in grouped {
        match result {
            Ok(mut bars) => {
                bars.sort_by_key(|b| b.date);
                loaded.series.push(InstrumentSeries {
                    instrument_id,
                    bars,
                });
            }
            Err(e) => loaded.rejected.push((instrument_id, e)),
        }
    }
    Ok(loaded)
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// Covers dates, statuses and prices in instrument order, so two runs over
/// the same input carry the same hash in their manifests.
pub fn dataset_hash(series: &[InstrumentSeries]) -> String {
    let mut hasher = blake3::Hasher::new();

    let mut ordered: Vec<&InstrumentSeries> = series.iter().collect();
    ordered.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));

    for s in ordered {
        hasher.update(s.instrument_id.as_bytes());
        for bar in &s.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(bar.status.as_deref().unwrap_or("").as_bytes());
            for value in [bar.open, bar.high, bar.low, bar.close, bar.stop_loss] {
                hasher.update(&value.unwrap_or(f64::NAN).to_le_bytes());
            }
            hasher.update(&bar.volume.unwrap_or(0).to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic signal bars for development and demos.
///
/// A seeded random walk from 100.0 over weekdays, with ENTRY_LONG / EXIT_LONG
/// tags sprinkled in. Same instrument id and dates always give the same bars.
pub fn generate_synthetic_bars(instrument_id: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(instrument_id.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut in_signal = false;
    let mut current = start;

    while current <= end {
        let date = current;
        current += chrono::Duration::days(1);
        if date.weekday().number_from_monday() > 5 {
            continue;
        }

        let open = price;
        let close = open * (1.0 + rng.gen_range(-0.025..0.03));
        let wick: f64 = rng.gen_range(0.0..0.012);
        let high = open.max(close) * (1.0 + wick);
        let low = open.min(close) * (1.0 - wick / 2.0);
        let volume = rng.gen_range(100_000..2_000_000u64);

        let (status, stop_loss, summary) = if !in_signal && rng.gen_bool(0.08) {
            in_signal = true;
            (
                "ENTRY_LONG",
                Some(close * 0.95),
                Some(format!("synthetic entry at {close:.2}")),
            )
        } else if in_signal && rng.gen_bool(0.12) {
            in_signal = false;
            ("EXIT_LONG", None, Some(format!("synthetic exit at {close:.2}")))
        } else if in_signal {
            ("HOLD", None, None)
        } else {
            ("NO_SIGNAL", None, None)
        };

        bars.push(Bar {
            instrument_id: instrument_id.to_string(),
            date,
            status: Some(status.to_string()),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
            stop_loss,
            trade_summary: summary,
        });

        price = close;
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
instrument_id,date,status,open,high,low,close,volume,stop_loss,trade_summary
TCS,2024-01-03,HOLD,101,103,100,102,1100,,
TCS,2024-01-02,ENTRY_LONG,100,102,99,101,1000,95,breakout
INFY,2024-01-02,,50,51,49,50.5,nan,,
INFY,2024-01-03,EXIT_LONG,50.5,52,50,51.5,2000,NaN,
";

    #[test]
    fn groups_and_sorts_by_instrument_and_date() {
        let loaded = load_bars_from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.series.len(), 2);
        assert_eq!(loaded.series[0].instrument_id, "INFY");
        assert_eq!(loaded.series[1].instrument_id, "TCS");

        let tcs = &loaded.series[1].bars;
        assert_eq!(tcs[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(tcs[0].status.as_deref(), Some("ENTRY_LONG"));
        assert_eq!(tcs[0].stop_loss, Some(95.0));
        assert_eq!(tcs[0].trade_summary.as_deref(), Some("breakout"));
        assert_eq!(tcs[1].stop_loss, None);
        assert_eq!(loaded.bar_count(), 4);
    }

    #[test]
    fn empty_and_nan_cells_are_missing() {
        let loaded = load_bars_from_reader(SAMPLE.as_bytes()).unwrap();
        let infy = &loaded.series[0].bars;
        assert_eq!(infy[0].status, None);
        assert_eq!(infy[0].volume, None);
        assert_eq!(infy[1].stop_loss, None);
        assert_eq!(infy[1].volume, Some(2000));
    }

    #[test]
    fn bad_date_rejects_only_that_instrument() {
        let csv = "\
instrument_id,date,close
TCS,2024-01-02,100
TCS,02/01/2024,101
INFY,2024-01-02,50
";
        let loaded = load_bars_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.series[0].instrument_id, "INFY");
        assert_eq!(
            loaded.rejected,
            vec![(
                "TCS".to_string(),
                BarLoadError::InvalidDate {
                    row: 3,
                    value: "02/01/2024".into()
                }
            )]
        );
    }

    #[test]
    fn bad_number_rejects_instrument() {
        let csv = "instrument_id,date,close\nTCS,2024-01-02,abc\n";
        let loaded = load_bars_from_reader(csv.as_bytes()).unwrap();
        assert!(loaded.series.is_empty());
        assert!(matches!(
            loaded.rejected[0].1,
            BarLoadError::InvalidNumber { field: "close", .. }
        ));
    }

    #[test]
    fn missing_close_is_left_for_replay() {
        let csv = "instrument_id,date,close\nTCS,2024-01-02,\n";
        let loaded = load_bars_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(loaded.series[0].bars[0].close, None);
    }

    #[test]
    fn price_table_column_aliases() {
        let csv = "company_code,date,open,high,low,close,volume,adj_close\n\
                   RELIANCE,2024-01-02,2500,2540,2480,2530,1200000,2530\n";
        let loaded = load_bars_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(loaded.series[0].instrument_id, "RELIANCE");
        assert_eq!(loaded.series[0].bars[0].high, Some(2540.0));
    }

    #[test]
    fn retain_instruments_filters_both_lists() {
        let mut loaded = load_bars_from_reader(SAMPLE.as_bytes()).unwrap();
        loaded.retain_instruments(&["TCS".to_string()]);
        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.series[0].instrument_id, "TCS");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_bars_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn dataset_hash_is_order_independent_and_content_sensitive() {
        let loaded = load_bars_from_reader(SAMPLE.as_bytes()).unwrap();
        let mut reversed = loaded.series.clone();
        reversed.reverse();
        assert_eq!(dataset_hash(&loaded.series), dataset_hash(&reversed));

        let mut changed = loaded.series.clone();
        changed[0].bars[0].close = Some(99.0);
        assert_ne!(dataset_hash(&loaded.series), dataset_hash(&changed));
    }

    #[test]
    fn synthetic_bars_are_deterministic_and_weekday_only() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let a = generate_synthetic_bars("SYNTH", start, end);
        let b = generate_synthetic_bars("SYNTH", start, end);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.iter().all(|bar| bar.date.weekday().num_days_from_monday() < 5));
        assert!(a.iter().all(|bar| bar.close_price().is_some()));
        assert!(a.windows(2).all(|w| w[0].date < w[1].date));
    }
}
