//! Performance summary — final statistics over a set of trades.
//!
//! The same computation serves a single instrument, the global union of all
//! instruments, and every prefix used by the rolling snapshots.
//!
//! Counting rules:
//! - `total_trades` counts every trade, OPEN included, and drives confidence
//! - `win_rate` divides by closed (WIN + LOSS) trades only
//! - win/loss statistics, Sharpe, Sortino and the cumulative curve use
//!   closed trades only
//! - `avg_pnl`, best/worst and `avg_days_held` describe all trades, with
//!   OPEN trades marked to their last close
//! - a flat cumulative curve over a non-empty trade set reports the
//!   profile's recovery sentinel

use serde::{Deserialize, Serialize};
use tradetrack_core::Trade;

use crate::ratio::Ratio;
use crate::scoring::{PerformanceCategory, ScoreInputs, ScoringProfile};
use crate::stats::{annualized_sharpe, annualized_sortino, cumulative_drawdown_pct, mean};

/// Aggregate performance statistics for a trade set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    // ── Counts ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub open_trades: usize,

    // ── Rates and averages (percent units) ──
    pub win_rate: f64,
    pub avg_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_days_held: f64,

    // ── Ratios ──
    pub win_loss_ratio: Ratio,
    pub profit_factor: Ratio,
    pub portfolio_drawdown: f64,
    pub recovery_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,

    // ── Composite ──
    pub trade_confidence: f64,
    pub composite_score: f64,
    pub performance_category: PerformanceCategory,
    pub confidence: f64,
}

impl PerformanceSummary {
    /// Compute every statistic over `trades` in one pass per metric family.
    ///
    /// Trade order does not matter: the cumulative curve is rebuilt in
    /// `(entry_date, instrument_id)` order.
    pub fn compute(trades: &[Trade], profile: &ScoringProfile) -> Self {
        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.instrument_id.cmp(&b.instrument_id))
        });

        let closed_pnls: Vec<f64> = ordered
            .iter()
            .filter(|t| t.is_closed())
            .map(|t| t.pnl_pct)
            .collect();
        let wins: Vec<f64> = ordered
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl_pct)
            .collect();
        let losses: Vec<f64> = ordered
            .iter()
            .filter(|t| t.is_loser())
            .map(|t| t.pnl_pct)
            .collect();
        let all_pnls: Vec<f64> = ordered.iter().map(|t| t.pnl_pct).collect();

        let total_trades = trades.len();
        let winning_trades = wins.len();
        let losing_trades = losses.len();
        let closed_trades = closed_pnls.len();
        let open_trades = total_trades - closed_trades;

        let win_rate = if closed_trades > 0 {
            winning_trades as f64 / closed_trades as f64 * 100.0
        } else {
            0.0
        };

        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let total_pnl: f64 = closed_pnls.iter().sum();

        let portfolio_drawdown = cumulative_drawdown_pct(&closed_pnls);
        let recovery_factor = if total_trades == 0 {
            0.0
        } else if portfolio_drawdown == 0.0 {
            profile.recovery_sentinel
        } else {
            total_pnl / portfolio_drawdown
        };

        let returns: Vec<f64> = closed_pnls.iter().map(|p| p / 100.0).collect();
        let sharpe_ratio = annualized_sharpe(&returns, profile.annualization);
        let sortino_ratio = annualized_sortino(&returns, profile.annualization);

        let win_loss_ratio = Ratio::of(avg_win, avg_loss.abs());
        let profit_factor = Ratio::of(gross_profit, gross_loss.abs());

        let days: Vec<f64> = ordered.iter().map(|t| f64::from(t.days_held)).collect();

        let score = profile.score(&ScoreInputs {
            total_trades,
            win_rate,
            profit_factor,
            recovery_factor,
            sharpe_ratio,
            sortino_ratio,
            win_loss_ratio,
        });

        Self {
            total_trades,
            winning_trades,
            losing_trades,
            open_trades,
            win_rate,
            avg_pnl: mean(&all_pnls),
            avg_win,
            avg_loss,
            total_pnl,
            best_trade: all_pnls.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_trade: all_pnls.iter().copied().reduce(f64::min).unwrap_or(0.0),
            avg_days_held: mean(&days),
            win_loss_ratio,
            profit_factor,
            portfolio_drawdown,
            recovery_factor,
            sharpe_ratio,
            sortino_ratio,
            trade_confidence: score.trade_confidence,
            composite_score: score.composite_score,
            performance_category: score.performance_category,
            confidence: score.confidence,
        }
    }
}
