//! Statistical helpers — pure functions over plain `f64` slices.
//!
//! Every helper returns 0.0 for degenerate input (empty, too short, zero
//! variance) so callers never see NaN.

/// Arithmetic mean; 0.0 when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); 0.0 with fewer than 2 values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Annualized Sharpe: mean(r) / std(r) * sqrt(periods).
///
/// Returns 0.0 with fewer than 2 returns or zero variance.
pub fn annualized_sharpe(returns: &[f64], periods: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(returns) / std * periods.sqrt()
}

/// Annualized Sortino: mean(r) / std(negative r) * sqrt(periods).
///
/// The downside deviation is the sample standard deviation of the strictly
/// negative returns only. Returns 0.0 with fewer than 2 negative returns or
/// zero downside variance.
pub fn annualized_sortino(returns: &[f64], periods: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return 0.0;
    }
    let downside_std = std_dev(&downside);
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(returns) / downside_std * periods.sqrt()
}

/// Max drawdown of the cumulative sum of `pnls`, in percent of the peak.
///
/// The running peak starts at zero, so a curve that never rises above zero
/// has no drawdown by definition.
pub fn cumulative_drawdown_pct(pnls: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        cumulative += pnl;
        peak = peak.max(cumulative);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - cumulative) / peak * 100.0);
        }
    }
    max_dd
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
