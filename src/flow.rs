//! Flow uniformity as a viscosity proxy.
//!
//! A calm, uniform gradient field reads as a thick, viscous coating; a
//! speckled, high-dispersion field reads as a thin, runny one.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Maximum representable intensity, used to normalize the dispersion.
const MAX_INTENSITY: f64 = 255.0;

/// Output of the flow analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    /// Standard deviation of gradient magnitude over 255, clamped to `[0, 1]`.
    pub uniformity: f64,
    /// `weight * (1 - uniformity)`, in `[0, 1]`.
    pub score: f64,
}

/// Per-pixel Sobel gradient magnitude `sqrt(gx^2 + gy^2)`.
#[must_use]
pub fn gradient_magnitude(gray: &GrayImage) -> Vec<f64> {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    gx.pixels()
        .zip(gy.pixels())
        .map(|(x, y)| f64::from(x[0]).hypot(f64::from(y[0])))
        .collect()
}

/// Population standard deviation of a slice; 0 when empty.
fn stddev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Score how uniform the gradient field of `gray` is.
#[must_use]
pub fn analyze(gray: &GrayImage, weight: f64) -> Flow {
    let magnitude = gradient_magnitude(gray);
    let uniformity = (stddev(&magnitude) / MAX_INTENSITY).clamp(0.0, 1.0);
    Flow {
        uniformity,
        score: weight * (1.0 - uniformity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn stddev_of_known_values() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((stddev(&data) - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(stddev(&[]).abs() < f64::EPSILON);
        assert!(stddev(&[0.42; 10]).abs() < 1e-12);
    }

    #[test]
    fn flat_frame_scores_the_weight_exactly() {
        let gray = GrayImage::from_pixel(16, 16, Luma([90]));
        let flow = analyze(&gray, 0.7);
        assert!(flow.uniformity.abs() < f64::EPSILON);
        assert!((flow.score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn gradient_detects_vertical_edge() {
        let gray = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let magnitude = gradient_magnitude(&gray);
        assert!(magnitude[5 * 10 + 5] > 0.0);
        assert!(magnitude[5 * 10 + 1].abs() < f64::EPSILON);
    }

    #[test]
    fn speckle_scores_lower_than_flat() {
        let speckle = GrayImage::from_fn(32, 32, |x, y| {
            Luma([if (x / 2 + y / 2) % 2 == 0 { 0 } else { 255 }])
        });
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        let speckle = analyze(&speckle, 0.7);
        let flat = analyze(&flat, 0.7);
        assert!(speckle.score < flat.score);
        assert!((0.0..=0.7).contains(&speckle.score));
    }
}
