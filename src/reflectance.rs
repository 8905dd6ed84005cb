//! Specular highlight (gloss) measurement.

use image::GrayImage;

use crate::mask::{self, Mask};

/// Output of the reflectance analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reflectance {
    /// Reflective pixels over the reference population, in `[0, 1]`.
    pub ratio: f64,
    /// Reflective pixels (restricted to the substance when scoped).
    pub mask: Mask,
}

/// Measure the fraction of pixels brighter than `threshold`.
///
/// With `substance = None` the ratio is over every frame pixel. With a
/// substance mask only reflective substance pixels count and the ratio is over
/// substance pixels, so highlights on the background cannot skew it. An empty
/// substance mask gives a ratio of 0.
#[must_use]
pub fn analyze(gray: &GrayImage, threshold: u8, substance: Option<&Mask>) -> Reflectance {
    let highlights = Mask::from_fn(gray, |px| px[0] > threshold);

    let (mask, population) = match substance {
        Some(substance) => (highlights.intersect(substance), substance.count()),
        None => {
            let area = highlights.area();
            (highlights, area)
        }
    };

    Reflectance {
        ratio: mask::ratio(mask.count(), population),
        mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn fully_reflective_frame_has_ratio_one() {
        let gray = GrayImage::from_pixel(10, 10, Luma([255]));
        let result = analyze(&gray, 200, None);
        assert!((result.ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.mask.count(), 100);
    }

    #[test]
    fn threshold_is_strict() {
        let gray = GrayImage::from_pixel(4, 4, Luma([200]));
        assert!(analyze(&gray, 200, None).ratio.abs() < f64::EPSILON);
        assert!((analyze(&gray, 199, None).ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn substance_scope_ignores_background_highlights() {
        // Left half substance, top row bright everywhere.
        let gray = GrayImage::from_fn(4, 4, |_, y| Luma([if y == 0 { 250 } else { 50 }]));
        let substance = Mask::from_gray(GrayImage::from_fn(4, 4, |x, _| Luma([u8::from(x < 2)])));

        let whole = analyze(&gray, 200, None);
        assert!((whole.ratio - 0.25).abs() < 1e-12);

        let scoped = analyze(&gray, 200, Some(&substance));
        assert_eq!(scoped.mask.count(), 2);
        assert!((scoped.ratio - 0.25).abs() < 1e-12);
        assert!(!scoped.mask.is_selected(3, 0));
    }

    #[test]
    fn empty_substance_gives_zero_ratio() {
        let gray = GrayImage::from_pixel(4, 4, Luma([255]));
        let result = analyze(&gray, 200, Some(&Mask::empty(4, 4)));
        assert!(result.ratio.abs() < f64::EPSILON);
        assert!(!result.ratio.is_nan());
        assert_eq!(result.mask.count(), 0);
    }
}
