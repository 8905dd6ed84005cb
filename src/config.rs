//! Analyzer configuration, presets and validation.
//!
//! Configuration is loaded once, validated once, and then shared read-only by
//! every invocation of the pipeline. A TOML file only needs to name the keys it
//! changes; everything else falls back to the [`AnalyzerConfig::advanced`] preset.
//!
//! ```toml
//! fusion = "banded"
//! mask_selection = "largest"
//! gloss_threshold = 210
//!
//! [[profiles]]
//! name = "yellow"
//! range = { kind = "simple", lower = [15, 100, 100], upper = [25, 255, 255] }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{default_profiles, ColorProfile};
use crate::error::{Error, Result};

/// Tolerance when checking that fusion weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// How per-signal scores are combined into the final percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FusionPolicy {
    /// Fixed weighted sum of all four signals.
    #[default]
    WeightedLinear,
    /// Coverage bands with a reflection-based dampening factor.
    Banded,
}

/// How per-profile masks are merged into the substance mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskSelection {
    /// Pixel-wise union of every profile's mask.
    #[default]
    Union,
    /// Only the single profile mask with the most selected pixels.
    Largest,
}

/// Which pixels the reflection ratio is measured over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectanceScope {
    /// Reflective pixels over all frame pixels.
    #[default]
    Frame,
    /// Reflective substance pixels over substance pixels.
    Substance,
}

/// Weights of the weighted-linear fusion policy. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    /// Weight of color coverage.
    pub color: f64,
    /// Weight of `1 - reflection_ratio`.
    pub reflection: f64,
    /// Weight of the texture score.
    pub texture: f64,
    /// Weight of the viscosity score.
    pub viscosity: f64,
}

impl FusionWeights {
    /// Sum of all four weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.color + self.reflection + self.texture + self.viscosity
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            color: 0.4,
            reflection: 0.2,
            texture: 0.3,
            viscosity: 0.1,
        }
    }
}

/// Everything the pipeline needs besides the frame itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Fusion policy selector.
    pub fusion: FusionPolicy,
    /// Union-of-masks or best-mask-wins.
    pub mask_selection: MaskSelection,
    /// Whole-frame or substance-only reflection ratio.
    pub reflectance_scope: ReflectanceScope,
    /// Intensity above which a pixel counts as a specular highlight.
    pub gloss_threshold: u8,
    /// Total Gaussian sigma seen by the edge detector, its built-in smoothing included.
    pub edge_sigma: f32,
    /// Lower hysteresis threshold of the edge detector (gradient magnitude).
    pub canny_low: f32,
    /// Upper hysteresis threshold of the edge detector (gradient magnitude).
    pub canny_high: f32,
    /// Steepness `K` of the texture curve `1 - exp(-density * K)`.
    pub texture_density_k: f64,
    /// Factor applied to `1 - flow_uniformity`.
    pub viscosity_weight: f64,
    /// Apply a morphological closing to the substance mask.
    pub close_mask: bool,
    /// Side of the square closing neighborhood (odd).
    pub kernel_size: u8,
    /// Resample every frame to `[width, height]` before analysis.
    pub working_size: Option<[u32; 2]>,
    /// Weighted-linear fusion weights.
    pub weights: FusionWeights,
    /// Ordered set of substance color profiles.
    pub profiles: Vec<ColorProfile>,
}

impl AnalyzerConfig {
    /// Default gloss threshold.
    pub const DEFAULT_GLOSS_THRESHOLD: u8 = 200;
    /// Default edge-detection smoothing.
    pub const DEFAULT_EDGE_SIGMA: f32 = 2.0;
    /// Default lower hysteresis threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 25.0;
    /// Default upper hysteresis threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 50.0;
    /// Default texture density constant.
    pub const DEFAULT_TEXTURE_DENSITY_K: f64 = 100.0;
    /// Default viscosity weight factor.
    pub const DEFAULT_VISCOSITY_WEIGHT: f64 = 0.7;
    /// Default closing kernel side.
    pub const DEFAULT_KERNEL_SIZE: u8 = 5;
    /// Working size of the simple preset.
    pub const SIMPLE_WORKING_SIZE: [u32; 2] = [640, 480];

    /// Union of masks, weighted-linear fusion, whole-frame reflectance.
    #[must_use]
    pub fn advanced() -> Self {
        Self {
            fusion: FusionPolicy::WeightedLinear,
            mask_selection: MaskSelection::Union,
            reflectance_scope: ReflectanceScope::Frame,
            gloss_threshold: Self::DEFAULT_GLOSS_THRESHOLD,
            edge_sigma: Self::DEFAULT_EDGE_SIGMA,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            texture_density_k: Self::DEFAULT_TEXTURE_DENSITY_K,
            viscosity_weight: Self::DEFAULT_VISCOSITY_WEIGHT,
            close_mask: true,
            kernel_size: Self::DEFAULT_KERNEL_SIZE,
            working_size: None,
            weights: FusionWeights::default(),
            profiles: default_profiles(),
        }
    }

    /// Best mask wins, banded fusion, substance-scoped reflectance, 640x480.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            fusion: FusionPolicy::Banded,
            mask_selection: MaskSelection::Largest,
            reflectance_scope: ReflectanceScope::Substance,
            close_mask: false,
            working_size: Some(Self::SIMPLE_WORKING_SIZE),
            ..Self::advanced()
        }
    }

    /// Parse a configuration from TOML. Does not validate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file. Does not validate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`AnalyzerConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check every invariant the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(Error::Config("profile set is empty".to_string()));
        }

        let mut names = HashSet::new();
        for profile in &self.profiles {
            if profile.name.trim().is_empty() {
                return Err(Error::Config("profile name is empty".to_string()));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
            profile.range.check(&profile.name).map_err(Error::Config)?;
        }

        let w = &self.weights;
        if [w.color, w.reflection, w.texture, w.viscosity]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::Config(format!(
                "fusion weights must be non-negative, got {w:?}"
            )));
        }
        if (w.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::Config(format!(
                "fusion weights must sum to 1, got {}",
                w.sum()
            )));
        }

        if !(0.0..=1.0).contains(&self.viscosity_weight) {
            return Err(Error::Config(format!(
                "viscosity_weight must be within [0, 1], got {}",
                self.viscosity_weight
            )));
        }
        if !(self.edge_sigma.is_finite() && self.edge_sigma > 0.0) {
            return Err(Error::Config(format!(
                "edge_sigma must be positive, got {}",
                self.edge_sigma
            )));
        }
        if !(self.texture_density_k.is_finite() && self.texture_density_k > 0.0) {
            return Err(Error::Config(format!(
                "texture_density_k must be positive, got {}",
                self.texture_density_k
            )));
        }
        let ordered = self.canny_low >= 0.0 && self.canny_low <= self.canny_high;
        if !(ordered && self.canny_high.is_finite()) {
            return Err(Error::Config(format!(
                "edge thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(Error::Config(format!(
                "kernel_size must be odd and positive, got {}",
                self.kernel_size
            )));
        }
        if let Some([width, height]) = self.working_size {
            if width == 0 || height == 0 {
                return Err(Error::Config(format!(
                    "working_size must be non-zero, got {width}x{height}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::advanced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HsvBounds;

    #[test]
    fn presets_are_valid() {
        assert!(AnalyzerConfig::advanced().validate().is_ok());
        assert!(AnalyzerConfig::simple().validate().is_ok());
    }

    #[test]
    fn presets_differ_only_in_strategy() {
        let simple = AnalyzerConfig::simple();
        let advanced = AnalyzerConfig::advanced();
        assert_eq!(simple.fusion, FusionPolicy::Banded);
        assert_eq!(simple.mask_selection, MaskSelection::Largest);
        assert_eq!(simple.reflectance_scope, ReflectanceScope::Substance);
        assert_eq!(simple.profiles, advanced.profiles);
        assert_eq!(simple.gloss_threshold, 200);
    }

    #[test]
    fn empty_profile_set_is_rejected() {
        let config = AnalyzerConfig {
            profiles: Vec::new(),
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn duplicate_profile_names_are_rejected() {
        let mut config = AnalyzerConfig::default();
        config.profiles.push(ColorProfile::simple("yellow", [0, 0, 0], [1, 1, 1]));
        assert!(config.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let config = AnalyzerConfig {
            weights: FusionWeights {
                color: 0.5,
                ..FusionWeights::default()
            },
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("sum to 1"));

        let negative = AnalyzerConfig {
            weights: FusionWeights {
                color: 1.2,
                reflection: -0.2,
                texture: 0.0,
                viscosity: 0.0,
            },
            ..AnalyzerConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn scalar_parameters_are_checked() {
        let cases = [
            AnalyzerConfig {
                viscosity_weight: 1.5,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                edge_sigma: 0.0,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                texture_density_k: -1.0,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                canny_low: 60.0,
                canny_high: 50.0,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                kernel_size: 4,
                ..AnalyzerConfig::default()
            },
            AnalyzerConfig {
                working_size: Some([0, 480]),
                ..AnalyzerConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn inverted_profile_bounds_are_rejected() {
        let config = AnalyzerConfig {
            profiles: vec![ColorProfile::simple("bad", [50, 0, 0], [40, 255, 255])],
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
fusion = "banded"
mask_selection = "largest"
gloss_threshold = 210

[[profiles]]
name = "yellow"
range = { kind = "simple", lower = [15, 100, 100], upper = [25, 255, 255] }

[[profiles]]
name = "red"

[profiles.range]
kind = "wrapping"
ranges = [
    { lower = [0, 100, 100], upper = [10, 255, 255] },
    { lower = [170, 100, 100], upper = [180, 255, 255] },
]
"#,
        )
        .unwrap();

        assert_eq!(config.fusion, FusionPolicy::Banded);
        assert_eq!(config.mask_selection, MaskSelection::Largest);
        assert_eq!(config.reflectance_scope, ReflectanceScope::Frame);
        assert_eq!(config.gloss_threshold, 210);
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(
            config.profiles[1],
            ColorProfile::wrapping(
                "red",
                HsvBounds::new([0, 100, 100], [10, 255, 255]),
                HsvBounds::new([170, 100, 100], [180, 255, 255]),
            )
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sample_file_matches_advanced_preset() {
        let sample = include_str!("../thickness.example.toml");
        let config = AnalyzerConfig::from_toml_str(sample).unwrap();
        assert_eq!(config, AnalyzerConfig::advanced());
    }

    #[test]
    fn out_of_range_threshold_fails_to_parse() {
        let err = AnalyzerConfig::from_toml_str("gloss_threshold = 300").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn toml_round_trip_preserves_presets() {
        let simple = AnalyzerConfig::simple();
        let text = simple.to_toml_string().unwrap();
        assert_eq!(AnalyzerConfig::from_toml_str(&text).unwrap(), simple);
    }
}
