//! Fusion of per-signal scores into a thickness percentage.
//!
//! Two policies are available:
//! 1. **Weighted-linear**: `0.4*coverage + 0.2*(1 - reflection) + 0.3*texture
//!    + 0.1*viscosity` with configurable weights, scaled to a percentage.
//! 2. **Banded**: coverage is mapped through thickness bands, each with its own
//!    multiplier, then dampened by glossiness. Thick layers are dampened less.
//!
//! Both round to two decimals and never leave `[0, 100]`.

use serde::Serialize;

use crate::config::{FusionPolicy, FusionWeights};

/// Reflection dampening factor for thick bands.
const THICK_DAMPENING: f64 = 0.3;
/// Reflection dampening factor for thinner bands.
const THIN_DAMPENING: f64 = 0.7;

/// The four per-signal scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Signals {
    /// Fraction of substance pixels.
    pub color_coverage: f64,
    /// Fraction of reflective pixels.
    pub reflection_ratio: f64,
    /// Saturated grain density.
    pub texture_score: f64,
    /// Flow uniformity score.
    pub viscosity_score: f64,
}

/// Qualitative thickness band of the banded policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThicknessBand {
    /// Coverage below 5%.
    VeryThin,
    /// Coverage in `[5%, 20%)`.
    Thin,
    /// Coverage in `[20%, 50%)`.
    Medium,
    /// Coverage in `[50%, 80%)`.
    Thick,
    /// Coverage of 80% and above.
    VeryThick,
}

impl ThicknessBand {
    /// Band for a coverage percentage in `[0, 100]`.
    #[must_use]
    pub fn for_coverage(percent: f64) -> Self {
        if percent < 5.0 {
            Self::VeryThin
        } else if percent < 20.0 {
            Self::Thin
        } else if percent < 50.0 {
            Self::Medium
        } else if percent < 80.0 {
            Self::Thick
        } else {
            Self::VeryThick
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::VeryThin => "Very Thin",
            Self::Thin => "Thin layer",
            Self::Medium => "Medium layer",
            Self::Thick => "Thick layer",
            Self::VeryThick => "Very Thick layer",
        }
    }

    /// Coverage multiplier applied inside this band.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::VeryThin => 0.8,
            Self::Thin => 0.9,
            Self::Medium => 1.1,
            Self::Thick => 1.3,
            Self::VeryThick => 1.5,
        }
    }

    /// Whether glossiness matters less because the layer is already thick.
    #[must_use]
    pub fn is_thick(self) -> bool {
        matches!(self, Self::Thick | Self::VeryThick)
    }
}

impl std::fmt::Display for ThicknessBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fused score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused {
    /// Final thickness percentage in `[0, 100]`, two decimals.
    pub percentage: f64,
    /// Thickness band (banded policy only).
    pub band: Option<ThicknessBand>,
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp to `[0, 100]`, mapping NaN to 0.
fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Weighted sum of all signals, as a percentage.
#[must_use]
pub fn weighted_linear(signals: &Signals, weights: &FusionWeights) -> f64 {
    let score = weights.color * signals.color_coverage
        + weights.reflection * (1.0 - signals.reflection_ratio)
        + weights.texture * signals.texture_score
        + weights.viscosity * signals.viscosity_score;
    round2(clamp_percent(score * 100.0))
}

/// Banded coverage with reflection dampening, as a percentage plus its band.
#[must_use]
pub fn banded(signals: &Signals) -> (f64, ThicknessBand) {
    let base = clamp_percent(signals.color_coverage * 100.0);
    let band = ThicknessBand::for_coverage(base);
    let banded = (base * band.multiplier()).min(100.0);

    let factor = if band.is_thick() {
        THICK_DAMPENING
    } else {
        THIN_DAMPENING
    };
    let dampening = 1.0 - signals.reflection_ratio * factor;

    (round2(clamp_percent(banded * dampening)), band)
}

/// Apply `policy` to `signals`.
#[must_use]
pub fn fuse(policy: FusionPolicy, signals: &Signals, weights: &FusionWeights) -> Fused {
    match policy {
        FusionPolicy::WeightedLinear => Fused {
            percentage: weighted_linear(signals, weights),
            band: None,
        },
        FusionPolicy::Banded => {
            let (percentage, band) = banded(signals);
            Fused {
                percentage,
                band: Some(band),
            }
        }
    }
}
