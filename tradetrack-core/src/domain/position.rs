use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open holding, owned by the replayer between entry and exit.
///
/// Single-unit quantity: no sizing is modeled, so P&L is per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument_id: String,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_stop_loss: Option<f64>,
    pub entry_summary: Option<String>,
    /// Running mark-to-market return in percent.
    pub pnl_pct: f64,
    pub last_close: f64,
}

impl Position {
    pub fn open(
        instrument_id: &str,
        entry_index: usize,
        entry_date: NaiveDate,
        entry_price: f64,
        entry_stop_loss: Option<f64>,
        entry_summary: Option<String>,
    ) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            entry_index,
            entry_date,
            entry_price,
            entry_stop_loss,
            entry_summary,
            pnl_pct: 0.0,
            last_close: entry_price,
        }
    }

    /// Re-mark the position against a new close.
    pub fn mark(&mut self, close: f64) {
        self.last_close = close;
        self.pnl_pct = pnl_pct(self.entry_price, close);
    }

    pub fn unrealized_pl(&self) -> f64 {
        self.last_close - self.entry_price
    }
}

/// Percent return of `close` against `entry_price`.
pub fn pnl_pct(entry_price: f64, close: f64) -> f64 {
    (close / entry_price - 1.0) * 100.0
}
