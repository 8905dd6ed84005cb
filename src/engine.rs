//! Per-frame thickness pipeline and file helpers.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use serde::Serialize;

use crate::config::{AnalyzerConfig, ReflectanceScope};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::fusion::{self, round2, Signals, ThicknessBand};
use crate::texture::TextureParams;
use crate::visualize::Visualizations;
use crate::{flow, reflectance, segmentation, texture};

/// Output of analyzing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ThicknessResult {
    /// Final thickness percentage in `[0, 100]`, two decimals.
    pub percentage: f64,
    /// Qualitative band (banded fusion only).
    pub thickness: Option<ThicknessBand>,
    /// Substance coverage as a percentage, two decimals.
    pub color_coverage: f64,
    /// Reflective pixel ratio as a percentage, two decimals.
    pub reflection_ratio: f64,
    /// Texture score as a percentage, two decimals.
    pub texture_score: f64,
    /// Viscosity score as a percentage, two decimals.
    pub viscosity_score: f64,
    /// Unrounded signals in `[0, 1]`.
    pub signals: Signals,
    /// Winning profile in largest-mask mode.
    pub profile: Option<String>,
    /// Diagnostic images.
    pub visualizations: Visualizations,
}

impl ThicknessResult {
    /// The numeric part of the result, ready for serialization.
    #[must_use]
    pub fn summary(&self) -> ThicknessSummary {
        ThicknessSummary {
            percentage: self.percentage,
            thickness: self.thickness.map(ThicknessBand::label),
            color_coverage: self.color_coverage,
            reflection_ratio: self.reflection_ratio,
            texture_score: self.texture_score,
            viscosity_score: self.viscosity_score,
            profile: self.profile.clone(),
        }
    }
}

/// Serializable summary of a [`ThicknessResult`], without images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThicknessSummary {
    /// Final thickness percentage.
    pub percentage: f64,
    /// Band label, when banded fusion was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<&'static str>,
    /// Substance coverage percentage.
    pub color_coverage: f64,
    /// Reflective pixel percentage.
    pub reflection_ratio: f64,
    /// Texture score percentage.
    pub texture_score: f64,
    /// Viscosity score percentage.
    pub viscosity_score: f64,
    /// Winning profile name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct FrameReport {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Summary of the analysis, when it succeeded.
    pub summary: Option<ThicknessSummary>,
    /// Human-readable status message.
    pub message: String,
}

/// The thickness analyzer holding a validated configuration.
///
/// Create once with [`ThicknessAnalyzer::new()`] and reuse for every frame.
/// Analysis only borrows `self`, so one analyzer can serve many threads.
#[derive(Debug, Clone)]
pub struct ThicknessAnalyzer {
    config: AnalyzerConfig,
}

impl ThicknessAnalyzer {
    /// Create an analyzer, validating `config` once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the full pipeline on a validated frame.
    #[must_use]
    pub fn analyze(&self, frame: &Frame) -> ThicknessResult {
        let config = &self.config;
        let frame = match config.working_size {
            Some([w, h]) => frame.clone().resized(w, h),
            None => frame.clone(),
        };

        tracing::debug!(
            width = frame.width(),
            height = frame.height(),
            pixels = frame.pixel_count(),
            "analyzing frame"
        );

        let hsv = frame.to_hsv();
        let gray = frame.to_gray();

        let closing = config.close_mask.then_some(config.kernel_size);
        let seg = segmentation::classify(&hsv, &config.profiles, config.mask_selection, closing);
        tracing::debug!(
            coverage = seg.coverage,
            profile = seg.profile.as_deref().unwrap_or("-"),
            "color classification"
        );

        let scope = match config.reflectance_scope {
            ReflectanceScope::Frame => None,
            ReflectanceScope::Substance => Some(&seg.mask),
        };
        let refl = reflectance::analyze(&gray, config.gloss_threshold, scope);
        tracing::debug!(ratio = refl.ratio, "reflectance");

        let tex = texture::analyze(
            &gray,
            &TextureParams {
                sigma: config.edge_sigma,
                low: config.canny_low,
                high: config.canny_high,
                density_k: config.texture_density_k,
            },
        );
        tracing::debug!(
            particles = tex.particles,
            density = tex.density,
            score = tex.score,
            "texture"
        );

        let flow = flow::analyze(&gray, config.viscosity_weight);
        tracing::debug!(uniformity = flow.uniformity, score = flow.score, "flow");

        let signals = Signals {
            color_coverage: seg.coverage,
            reflection_ratio: refl.ratio,
            texture_score: tex.score,
            viscosity_score: flow.score,
        };
        let fused = fusion::fuse(config.fusion, &signals, &config.weights);
        tracing::debug!(
            percentage = fused.percentage,
            band = fused.band.map_or("-", ThicknessBand::label),
            "fusion"
        );

        let visualizations =
            Visualizations::render(frame.as_rgb(), &seg.mask, &refl.mask, &tex.edges);

        ThicknessResult {
            percentage: fused.percentage,
            thickness: fused.band,
            color_coverage: percent(signals.color_coverage),
            reflection_ratio: percent(signals.reflection_ratio),
            texture_score: percent(signals.texture_score),
            viscosity_score: percent(signals.viscosity_score),
            signals,
            profile: seg.profile,
            visualizations,
        }
    }

    /// Validate an RGB image as a frame, then analyze it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] for a zero-area image.
    pub fn analyze_image(&self, image: RgbImage) -> Result<ThicknessResult> {
        Ok(self.analyze(&Frame::from_image(image)?))
    }

    /// Process a single image file: load, analyze, optionally save diagnostics.
    ///
    /// Never fails outright; problems are reported in the [`FrameReport`].
    #[must_use]
    pub fn analyze_file(&self, input: &Path, output_dir: Option<&Path>) -> FrameReport {
        let mut report = FrameReport {
            path: input.to_path_buf(),
            success: false,
            summary: None,
            message: String::new(),
        };

        let frame = match Frame::open(input) {
            Ok(frame) => frame,
            Err(e) => {
                report.message = format!("Failed to load: {e}");
                return report;
            }
        };

        let result = self.analyze(&frame);
        report.summary = Some(result.summary());

        if let Some(dir) = output_dir {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            if let Err(e) = save_visualizations(&result, dir, &stem) {
                report.message = format!("Failed to save visualizations: {e}");
                return report;
            }
        }

        report.success = true;
        report.message = match result.thickness {
            Some(band) => format!("{:.2}% ({band})", result.percentage),
            None => format!("{:.2}%", result.percentage),
        };
        report
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Frames that fail to load are reported and skipped; the batch continues.
    #[must_use]
    pub fn analyze_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
    ) -> Vec<FrameReport> {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![FrameReport {
                    path: input_dir.to_path_buf(),
                    success: false,
                    summary: None,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };
        entries.sort();

        let process = |path: &PathBuf| {
            let report = self.analyze_file(path, output_dir);
            if !report.success {
                tracing::warn!(path = %path.display(), message = %report.message, "frame skipped");
            }
            report
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

fn percent(value: f64) -> f64 {
    round2((value * 100.0).clamp(0.0, 100.0))
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save every diagnostic image of `result` as `{dir}/{stem}_{name}.png`.
///
/// Creates `dir` if needed and returns the written paths.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an image cannot be written.
pub fn save_visualizations(
    result: &ThicknessResult,
    dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    result
        .visualizations
        .named()
        .into_iter()
        .map(|(name, img)| {
            let path = dir.join(format!("{stem}_{name}.png"));
            img.save_with_format(&path, ImageFormat::Png)
                .map_err(Error::Image)?;
            Ok(path)
        })
        .collect()
}

/// Generate a default diagnostics directory from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_thickness"`.
#[must_use]
pub fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_thickness"))
}
