//! Composite scoring — calibration profile, confidence curve, categories.
//!
//! All constants live in a `ScoringProfile` value handed to the aggregator,
//! so alternate calibrations can be loaded from TOML and tested side by side.
//!
//! Scoring steps:
//! 1. `trade_confidence = clamp(sigmoid(steepness * (n - center)), floor, ceiling)`
//! 2. Each metric is mapped linearly onto 0..100 against its calibration range
//! 3. Each normalized metric is multiplied by `trade_confidence`
//! 4. The composite is the weighted sum of the discounted metrics
//! 5. The composite is bucketed into a `PerformanceCategory`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ratio::Ratio;
use crate::stats::sigmoid;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Errors from validating a scoring profile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("calibration range for {metric} is empty or inverted: [{min}, {max}]")]
    InvalidRange {
        metric: &'static str,
        min: f64,
        max: f64,
    },

    #[error("weight for {metric} must be finite and non-negative, got {value}")]
    InvalidWeight { metric: &'static str, value: f64 },

    #[error("weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("confidence floor {floor} exceeds ceiling {ceiling}")]
    ConfidenceBounds { floor: f64, ceiling: f64 },

    #[error("{field} must be finite and positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

// ─── Profile ────────────────────────────────────────────────────────

/// Complete, immutable scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    /// Recovery factor reported when closed trades exist but the cumulative
    /// curve never drew down.
    pub recovery_sentinel: f64,
    /// Periods per year used to annualize Sharpe and Sortino.
    pub annualization: f64,
    pub confidence: ConfidenceCurve,
    pub calibration: Calibration,
    pub weights: Weights,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            recovery_sentinel: 100.0,
            annualization: 252.0,
            confidence: ConfidenceCurve::default(),
            calibration: Calibration::default(),
            weights: Weights::default(),
        }
    }
}

/// Sample-size discount: a clamped logistic curve over the trade count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceCurve {
    /// Trade count at which confidence reaches 0.5.
    pub center: f64,
    pub steepness: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ConfidenceCurve {
    fn default() -> Self {
        Self {
            center: 10.0,
            steepness: 0.2,
            floor: 0.2,
            ceiling: 1.0,
        }
    }
}

impl ConfidenceCurve {
    pub fn at(&self, total_trades: usize) -> f64 {
        let x = self.steepness * (total_trades as f64 - self.center);
        sigmoid(x).clamp(self.floor, self.ceiling)
    }
}

/// Linear mapping of a raw metric onto 0..100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f64,
    pub max: f64,
}

impl CalibrationRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `(value - min) / (max - min) * 100`, clamped to 0..100.
    ///
    /// +inf maps to 100; NaN and -inf map to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        if value.is_infinite() {
            return if value > 0.0 { 100.0 } else { 0.0 };
        }
        ((value - self.min) / (self.max - self.min) * 100.0).clamp(0.0, 100.0)
    }

    /// Unbounded ratios saturate at 100.
    pub fn normalize_ratio(&self, ratio: Ratio) -> f64 {
        match ratio {
            Ratio::Defined(v) => self.normalize(v),
            Ratio::Unbounded => 100.0,
        }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
}

/// Calibration range per metric. Win rate is already a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub profit_factor: CalibrationRange,
    pub recovery_factor: CalibrationRange,
    pub sharpe_ratio: CalibrationRange,
    pub sortino_ratio: CalibrationRange,
    pub win_loss_ratio: CalibrationRange,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            profit_factor: CalibrationRange::new(0.3, 5.0),
            recovery_factor: CalibrationRange::new(0.0, 15.0),
            sharpe_ratio: CalibrationRange::new(-1.0, 3.0),
            sortino_ratio: CalibrationRange::new(-1.0, 5.0),
            win_loss_ratio: CalibrationRange::new(0.25, 5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub win_rate: f64,
    pub profit_factor: f64,
    pub recovery_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_loss_ratio: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            win_rate: 0.25,
            profit_factor: 0.25,
            recovery_factor: 0.20,
            sharpe_ratio: 0.15,
            sortino_ratio: 0.10,
            win_loss_ratio: 0.05,
        }
    }
}

impl Weights {
    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("win_rate", self.win_rate),
            ("profit_factor", self.profit_factor),
            ("recovery_factor", self.recovery_factor),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("win_loss_ratio", self.win_loss_ratio),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }
}

// ─── Scoring ────────────────────────────────────────────────────────

/// The raw metrics the composite score is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: Ratio,
    pub recovery_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_loss_ratio: Ratio,
}

/// Result of scoring one set of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Sigmoid sample-size weight used as an input discount.
    pub trade_confidence: f64,
    pub composite_score: f64,
    pub performance_category: PerformanceCategory,
    /// `min(composite_score / 100, 1)`, reported alongside the category.
    pub confidence: f64,
}

impl ScoringProfile {
    /// Check ranges, weights and curve bounds.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let ranges = [
            ("profit_factor", self.calibration.profit_factor),
            ("recovery_factor", self.calibration.recovery_factor),
            ("sharpe_ratio", self.calibration.sharpe_ratio),
            ("sortino_ratio", self.calibration.sortino_ratio),
            ("win_loss_ratio", self.calibration.win_loss_ratio),
        ];
        for (metric, range) in ranges {
            if !range.is_valid() {
                return Err(ScoringError::InvalidRange {
                    metric,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for (metric, value) in self.weights.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidWeight { metric, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::WeightSum(sum));
        }

        let curve = &self.confidence;
        if !(curve.floor.is_finite() && curve.ceiling.is_finite()) || curve.floor > curve.ceiling {
            return Err(ScoringError::ConfidenceBounds {
                floor: curve.floor,
                ceiling: curve.ceiling,
            });
        }

        for (field, value) in [
            ("annualization", self.annualization),
            ("recovery_sentinel", self.recovery_sentinel),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoringError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    pub fn trade_confidence(&self, total_trades: usize) -> f64 {
        self.confidence.at(total_trades)
    }

    /// Confidence-weighted composite score in 0..100.
    pub fn score(&self, inputs: &ScoreInputs) -> CompositeScore {
        let trade_confidence = self.trade_confidence(inputs.total_trades);
        let cal = &self.calibration;
        let w = &self.weights;

        let win_rate_norm = if inputs.win_rate.is_finite() {
            inputs.win_rate.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let weighted = w.win_rate * win_rate_norm
            + w.profit_factor * cal.profit_factor.normalize_ratio(inputs.profit_factor)
            + w.recovery_factor * cal.recovery_factor.normalize(inputs.recovery_factor)
            + w.sharpe_ratio * cal.sharpe_ratio.normalize(inputs.sharpe_ratio)
            + w.sortino_ratio * cal.sortino_ratio.normalize(inputs.sortino_ratio)
            + w.win_loss_ratio * cal.win_loss_ratio.normalize_ratio(inputs.win_loss_ratio);

        // Every term shares the same discount, so it factors out.
        let composite_score = (weighted * trade_confidence).clamp(0.0, 100.0);

        CompositeScore {
            trade_confidence,
            composite_score,
            performance_category: PerformanceCategory::from_score(composite_score),
            confidence: (composite_score / 100.0).min(1.0),
        }
    }
}

// ─── Category ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Average,
    Good,
    Excellent,
}

impl PerformanceCategory {
    /// Buckets: <20, [20,40), [40,60), [60,80), >=80.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Average
        } else if score >= 20.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryPoor => "Very Poor",
            Self::Poor => "Poor",
            Self::Average => "Average",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
