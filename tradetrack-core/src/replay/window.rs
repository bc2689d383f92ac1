//! Path statistics over the bars of one trade window.
//!
//! The window is inclusive on both ends: entry bar through exit bar (or the
//! last available bar for an open trade).

use crate::domain::Bar;

/// Price path summary for a single trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Highest close in the window.
    pub high_water_mark: f64,
    /// (max high - min low) / entry price * 100.
    pub price_range_pct: f64,
    /// Max of (running max close - close) / running max close * 100.
    pub max_drawdown_pct: f64,
}

/// Compute path statistics for `window` relative to `entry_price`.
///
/// Bars without a usable close are skipped; missing high/low fall back to
/// close. An empty window yields all zeros.
pub fn window_stats(window: &[Bar], entry_price: f64) -> WindowStats {
    let mut max_high = f64::NEG_INFINITY;
    let mut min_low = f64::INFINITY;
    let mut running_max = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for bar in window {
        if let Some(high) = bar.high_or_close() {
            max_high = max_high.max(high);
        }
        if let Some(low) = bar.low_or_close() {
            min_low = min_low.min(low);
        }
        let Some(close) = bar.close_price() else {
            continue;
        };
        running_max = running_max.max(close);
        let dd = (running_max - close) / running_max * 100.0;
        max_dd = max_dd.max(dd);
    }

    let price_range_pct = if max_high.is_finite() && min_low.is_finite() && entry_price > 0.0 {
        (max_high - min_low) / entry_price * 100.0
    } else {
        0.0
    };

    WindowStats {
        high_water_mark: if running_max.is_finite() { running_max } else { 0.0 },
        price_range_pct,
        max_drawdown_pct: max_dd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, high: Option<f64>, low: Option<f64>, close: f64) -> Bar {
        let mut b = Bar::new(
            "INFY",
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            None,
            close,
        );
        b.high = high;
        b.low = low;
        b
    }

    #[test]
    fn range_and_drawdown_known_path() {
        let window = vec![
            bar(1, Some(102.0), Some(98.0), 100.0),
            bar(2, Some(125.0), Some(105.0), 120.0),
            bar(3, Some(115.0), Some(88.0), 90.0),
            bar(4, Some(101.0), Some(92.0), 96.0),
        ];
        let stats = window_stats(&window, 100.0);

        assert!((stats.high_water_mark - 120.0).abs() < 1e-10);
        // (125 - 88) / 100 * 100
        assert!((stats.price_range_pct - 37.0).abs() < 1e-10);
        // Peak 120, trough 90 → 25%
        assert!((stats.max_drawdown_pct - 25.0).abs() < 1e-10);
    }

    #[test]
    fn monotonic_rise_has_no_drawdown() {
        let window: Vec<Bar> = (1..=5)
            .map(|d| bar(d, None, None, 100.0 + d as f64))
            .collect();
        let stats = window_stats(&window, 101.0);
        assert_eq!(stats.max_drawdown_pct, 0.0);
        // Fallback to close: (105 - 101) / 101 * 100
        assert!((stats.price_range_pct - 4.0 / 101.0 * 100.0).abs() < 1e-10);
    }

    #[test]
    fn empty_window_is_zero() {
        let stats = window_stats(&[], 100.0);
        assert_eq!(stats.high_water_mark, 0.0);
        assert_eq!(stats.price_range_pct, 0.0);
        assert_eq!(stats.max_drawdown_pct, 0.0);
    }
}
