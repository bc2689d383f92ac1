//! Bar — one instrument's trading day, tagged with a signal status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::signal::Signal;

/// Daily OHLCV record for a single instrument, enriched with the status
/// column produced by the upstream signal model.
///
/// Only `close` is required for replay. Every other price field is optional
/// and degrades gracefully: missing `high`/`low` fall back to `close` when
/// the trade window statistics are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument_id: String,
    pub date: NaiveDate,
    pub status: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub stop_loss: Option<f64>,
    pub trade_summary: Option<String>,
}

impl Bar {
    /// Minimal bar with only the fields replay needs.
    pub fn new(
        instrument_id: impl Into<String>,
        date: NaiveDate,
        status: Option<&str>,
        close: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            date,
            status: status.map(str::to_string),
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
            stop_loss: None,
            trade_summary: None,
        }
    }

    /// Close price if present, finite and strictly positive.
    pub fn close_price(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite() && *c > 0.0)
    }

    /// Classify the status column into an entry/exit/hold signal.
    pub fn signal(&self) -> Signal {
        Signal::from_status(self.status.as_deref())
    }

    /// Intraday high, falling back to close.
    pub fn high_or_close(&self) -> Option<f64> {
        self.high
            .filter(|h| h.is_finite())
            .or_else(|| self.close_price())
    }

    /// Intraday low, falling back to close.
    pub fn low_or_close(&self) -> Option<f64> {
        self.low
            .filter(|l| l.is_finite())
            .or_else(|| self.close_price())
    }
}
