//! Trade — the realized (or still-open) record of one position lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome tag of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Win,
    Loss,
    /// Data ended while the position was still held.
    Open,
}

impl TradeStatus {
    /// WIN strictly above zero; a flat exit counts as a LOSS.
    pub fn from_closed_pnl(pnl_pct: f64) -> Self {
        if pnl_pct > 0.0 {
            Self::Win
        } else {
            Self::Loss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Loss => "LOSS",
            Self::Open => "OPEN",
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trade emitted by the replayer. Immutable once created.
///
/// For `Open` trades the exit fields are `None` and every derived field is
/// marked to `last_date`/`last_close`. For closed trades `last_*` equals the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub instrument_id: String,
    pub status: TradeStatus,

    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_stop_loss: Option<f64>,
    pub entry_summary: Option<String>,

    // ── Exit ──
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub exit_stop_loss: Option<f64>,
    pub exit_summary: Option<String>,

    // ── Mark-to-market point ──
    pub last_date: NaiveDate,
    pub last_close: f64,

    // ── PnL ──
    pub pnl_pct: f64,
    pub absolute_pl: f64,
    pub day_return: f64,
    pub annualized_return: f64,

    // ── Duration ──
    /// Calendar days, inclusive of both endpoints.
    pub days_held: u32,

    // ── Path ──
    /// Highest close inside the trade window.
    pub high_water_mark: f64,
    /// (max high - min low) / entry price, in percent.
    pub price_range_pct: f64,
    /// Worst peak-to-trough close decline inside the trade window, in percent.
    pub price_range_drawdown: f64,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.status != TradeStatus::Open
    }

    pub fn is_winner(&self) -> bool {
        self.status == TradeStatus::Win
    }

    pub fn is_loser(&self) -> bool {
        self.status == TradeStatus::Loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_pnl() {
        assert_eq!(TradeStatus::from_closed_pnl(0.01), TradeStatus::Win);
        assert_eq!(TradeStatus::from_closed_pnl(0.0), TradeStatus::Loss);
        assert_eq!(TradeStatus::from_closed_pnl(-3.0), TradeStatus::Loss);
    }

    #[test]
    fn status_serializes_as_upper_case() {
        let json = serde_json::to_string(&TradeStatus::Open).unwrap();
        assert_eq!(json, "\"OPEN\"");
        let back: TradeStatus = serde_json::from_str("\"WIN\"").unwrap();
        assert_eq!(back, TradeStatus::Win);
        assert_eq!(TradeStatus::Loss.to_string(), "LOSS");
    }
}
