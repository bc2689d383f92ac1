//! Ratios whose denominator can legitimately be zero.
//!
//! Profit factor and win/loss ratio are unbounded when a strategy has no
//! losses. Instead of letting `f64::INFINITY` leak into averages and
//! normalization, the outcome is tagged explicitly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const UNBOUNDED_TAG: &str = "inf";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    /// Positive numerator over a zero denominator.
    Unbounded,
}

impl Ratio {
    /// `numerator / denominator`, with a zero denominator mapped to
    /// `Unbounded` (positive numerator) or `Defined(0.0)` (otherwise).
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator.abs() < 1e-12 {
            if numerator > 0.0 {
                Self::Unbounded
            } else {
                Self::Defined(0.0)
            }
        } else {
            Self::Defined(numerator / denominator)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::Defined(0.0)
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Self::Unbounded => f.write_str(UNBOUNDED_TAG),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Defined(v) => serializer.serialize_f64(*v),
            Self::Unbounded => serializer.serialize_str(UNBOUNDED_TAG),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RatioRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RatioRepr::deserialize(deserializer)? {
            RatioRepr::Number(v) => Ok(Self::Defined(v)),
            RatioRepr::Text(s) if s == UNBOUNDED_TAG => Ok(Self::Unbounded),
            RatioRepr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{UNBOUNDED_TAG}\", got \"{s}\""
            ))),
        }
    }
}
