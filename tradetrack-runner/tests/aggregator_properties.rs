//! Property tests for the performance aggregator.
//!
//! 1. Composite score stays in 0..=100 and the category matches the bucket
//! 2. Counts add up and win rate is a percentage of closed trades
//! 3. Global profit factor is gross profit over gross loss of the pooled trades
//! 4. Trade confidence never decreases as trades are added
//! 5. The last rolling snapshot equals the final summary

use chrono::NaiveDate;
use proptest::prelude::*;
use tradetrack_core::{Trade, TradeStatus};
use tradetrack_runner::{rolling_snapshots, PerformanceCategory, PerformanceSummary, Ratio, ScoringProfile};

// ── Strategies (proptest) ────────────────────────────────────────────

fn make_trade(instrument: &str, day: i64, pnl_pct: f64, open: bool) -> Trade {
    let entry_date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(day);
    let close = 100.0 * (1.0 + pnl_pct / 100.0);
    let status = if open {
        TradeStatus::Open
    } else {
        TradeStatus::from_closed_pnl(pnl_pct)
    };
    Trade {
        instrument_id: instrument.into(),
        status,
        entry_date,
        entry_price: 100.0,
        entry_stop_loss: None,
        entry_summary: None,
        exit_date: (!open).then_some(entry_date),
        exit_price: (!open).then_some(close),
        exit_stop_loss: None,
        exit_summary: None,
        last_date: entry_date,
        last_close: close,
        pnl_pct,
        absolute_pl: close - 100.0,
        day_return: close - 100.0,
        annualized_return: 0.0,
        days_held: 1,
        high_water_mark: close.max(100.0),
        price_range_pct: 0.0,
        price_range_drawdown: 0.0,
    }
}

fn arb_trades(instrument: &'static str) -> impl Strategy<Value = Vec<Trade>> {
    prop::collection::vec((-40.0..60.0_f64, prop::bool::weighted(0.1)), 0..40).prop_map(
        move |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (pnl, open))| make_trade(instrument, i as i64 * 3, pnl, open))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn composite_score_is_bounded(trades in arb_trades("HINDALCO")) {
        let s = PerformanceSummary::compute(&trades, &ScoringProfile::default());
        prop_assert!((0.0..=100.0).contains(&s.composite_score));
        prop_assert!((0.0..=1.0).contains(&s.confidence));
        prop_assert_eq!(s.performance_category, PerformanceCategory::from_score(s.composite_score));
        prop_assert!(s.sharpe_ratio.is_finite());
        prop_assert!(s.sortino_ratio.is_finite());
        prop_assert!(s.recovery_factor.is_finite());
    }

    #[test]
    fn counts_add_up(trades in arb_trades("NTPC")) {
        let s = PerformanceSummary::compute(&trades, &ScoringProfile::default());
        prop_assert_eq!(s.winning_trades + s.losing_trades + s.open_trades, s.total_trades);
        prop_assert!((0.0..=100.0).contains(&s.win_rate));
        let closed = s.winning_trades + s.losing_trades;
        if closed > 0 {
            let expected = s.winning_trades as f64 / closed as f64 * 100.0;
            prop_assert!((s.win_rate - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn global_profit_factor_pools_gross_sums(
        a in arb_trades("AXISBANK"),
        b in arb_trades("ONGC"),
    ) {
        let mut pooled = a.clone();
        pooled.extend(b.iter().cloned());
        let s = PerformanceSummary::compute(&pooled, &ScoringProfile::default());

        let gross_profit: f64 = pooled.iter().filter(|t| t.is_winner()).map(|t| t.pnl_pct).sum();
        let gross_loss: f64 = pooled.iter().filter(|t| t.is_loser()).map(|t| t.pnl_pct).sum();
        if s.profit_factor.is_unbounded() {
            prop_assert!(gross_loss.abs() < 1e-12 && gross_profit > 0.0);
        } else if gross_loss.abs() >= 1e-12 {
            let pf = s.profit_factor.value().unwrap_or(f64::NAN);
            prop_assert!((pf - gross_profit / gross_loss.abs()).abs() < 1e-6);
        } else {
            prop_assert_eq!(s.profit_factor, Ratio::Defined(0.0));
        }
    }

    #[test]
    fn trade_confidence_is_monotonic(n in 0usize..200) {
        let profile = ScoringProfile::default();
        prop_assert!(profile.trade_confidence(n + 1) >= profile.trade_confidence(n));
    }

    #[test]
    fn last_snapshot_matches_summary(trades in arb_trades("TITAN")) {
        prop_assume!(!trades.is_empty());
        let profile = ScoringProfile::default();
        let details = rolling_snapshots(&trades, &profile);
        let summary = PerformanceSummary::compute(&trades, &profile);
        let last = details.last().unwrap();
        prop_assert_eq!(last.snapshot.composite_score, summary.composite_score);
        prop_assert_eq!(details.len(), trades.len());
    }
}
