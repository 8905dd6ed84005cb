//! Grain density from edge-derived particles.
//!
//! The grayscale frame is smoothed, run through a Canny detector, and the
//! 8-connected components of the edge map are counted as particles. Density
//! (particles per pixel) is mapped through `1 - exp(-density * K)`, which is 0
//! for a featureless frame and saturates towards 1 for dense grain.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::mask::{self, Mask};

/// Sigma of the Gaussian that `imageproc::edges::canny` applies internally.
pub const CANNY_SIGMA: f32 = 1.4;

/// Edge detector and density curve parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    /// Total Gaussian sigma seen by the edge detector, its own smoothing included.
    pub sigma: f32,
    /// Lower hysteresis threshold.
    pub low: f32,
    /// Upper hysteresis threshold.
    pub high: f32,
    /// Steepness of the saturating curve.
    pub density_k: f64,
}

/// Output of the texture analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Binary edge map.
    pub edges: Mask,
    /// Number of connected edge components.
    pub particles: u32,
    /// Particles per pixel.
    pub density: f64,
    /// Saturated density score in `[0, 1]`.
    pub score: f64,
}

/// Map a particle density to `[0, 1)` with `1 - exp(-density * k)`.
#[must_use]
pub fn density_score(density: f64, k: f64) -> f64 {
    (1.0 - (-density * k).exp()).clamp(0.0, 1.0)
}

/// Extra blur needed before Canny so the combined smoothing equals `sigma`.
///
/// Gaussians compose in quadrature, so this is `sqrt(sigma^2 - 1.4^2)`, or
/// `None` when Canny's own smoothing already reaches `sigma`.
#[must_use]
pub fn pre_blur_sigma(sigma: f32) -> Option<f32> {
    let extra = sigma * sigma - CANNY_SIGMA * CANNY_SIGMA;
    (extra > f32::EPSILON).then(|| extra.sqrt())
}

/// Detect edges in `gray` and score their particle density.
#[must_use]
pub fn analyze(gray: &GrayImage, params: &TextureParams) -> Texture {
    let edges = match pre_blur_sigma(params.sigma) {
        Some(extra) => canny(&gaussian_blur_f32(gray, extra), params.low, params.high),
        None => canny(gray, params.low, params.high),
    };
    let edges = Mask::from_gray(edges);

    let labels = connected_components(edges.as_image(), Connectivity::Eight, Luma([0u8]));
    let particles = labels.pixels().map(|p| p[0]).max().unwrap_or(0);

    let density = mask::ratio(u64::from(particles), edges.area());
    let score = density_score(density, params.density_k);

    Texture {
        edges,
        particles,
        density,
        score,
    }
}
