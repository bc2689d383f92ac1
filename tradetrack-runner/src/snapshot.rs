//! Per-trade rolling snapshots — "as of this trade" statistics and scores.
//!
//! For the i-th trade of an instrument (by entry date) the full summary is
//! recomputed over trades `1..=i`. Quadratic in the trade count, which is
//! fine for tens of trades per instrument.

use serde::{Deserialize, Serialize};
use tradetrack_core::Trade;

use crate::ratio::Ratio;
use crate::scoring::{PerformanceCategory, ScoringProfile};
use crate::summary::PerformanceSummary;

/// Statistics of the trade prefix ending at one trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSnapshot {
    pub trades_so_far: usize,
    pub win_rate: f64,
    pub profit_factor: Ratio,
    pub win_loss_ratio: Ratio,
    pub portfolio_drawdown: f64,
    pub recovery_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub trade_confidence: f64,
    pub composite_score: f64,
    pub performance_category: PerformanceCategory,
    pub confidence: f64,
}

impl From<&PerformanceSummary> for TradeSnapshot {
    fn from(summary: &PerformanceSummary) -> Self {
        Self {
            trades_so_far: summary.total_trades,
            win_rate: summary.win_rate,
            profit_factor: summary.profit_factor,
            win_loss_ratio: summary.win_loss_ratio,
            portfolio_drawdown: summary.portfolio_drawdown,
            recovery_factor: summary.recovery_factor,
            sharpe_ratio: summary.sharpe_ratio,
            sortino_ratio: summary.sortino_ratio,
            trade_confidence: summary.trade_confidence,
            composite_score: summary.composite_score,
            performance_category: summary.performance_category,
            confidence: summary.confidence,
        }
    }
}

/// One row of the trade-detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetail {
    pub trade: Trade,
    pub snapshot: TradeSnapshot,
}

/// Attach a rolling snapshot to each of one instrument's trades.
///
/// Output is ordered by entry date.
pub fn rolling_snapshots(trades: &[Trade], profile: &ScoringProfile) -> Vec<TradeDetail> {
    let mut ordered = trades.to_vec();
    ordered.sort_by_key(|t| t.entry_date);

    (0..ordered.len())
        .map(|i| {
            let summary = PerformanceSummary::compute(&ordered[..=i], profile);
            TradeDetail {
                trade: ordered[i].clone(),
                snapshot: TradeSnapshot::from(&summary),
            }
        })
        .collect()
}
