//! Diagnostic images for display. None of these affect the score.

use image::{Rgb, RgbImage};

use crate::mask::Mask;

/// Named diagnostic images produced for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualizations {
    /// The analyzed frame (after any resampling).
    pub frame: RgbImage,
    /// The frame restricted to substance pixels, background zeroed.
    pub substance: RgbImage,
    /// The substance mask.
    pub color_mask: RgbImage,
    /// The reflection mask.
    pub reflection_mask: RgbImage,
    /// The edge map used for texture scoring.
    pub texture_mask: RgbImage,
}

impl Visualizations {
    /// Render every diagnostic image.
    #[must_use]
    pub fn render(frame: &RgbImage, color: &Mask, reflection: &Mask, texture: &Mask) -> Self {
        Self {
            frame: frame.clone(),
            substance: apply_mask(frame, color),
            color_mask: mask_to_rgb(color),
            reflection_mask: mask_to_rgb(reflection),
            texture_mask: mask_to_rgb(texture),
        }
    }

    /// Images paired with their names, in a stable order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &RgbImage); 5] {
        [
            ("frame", &self.frame),
            ("substance", &self.substance),
            ("color_mask", &self.color_mask),
            ("reflection_mask", &self.reflection_mask),
            ("texture_mask", &self.texture_mask),
        ]
    }
}

/// Keep `frame` pixels where `mask` is selected, zero the rest.
#[must_use]
pub fn apply_mask(frame: &RgbImage, mask: &Mask) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        if mask.is_selected(x, y) {
            *frame.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Replicate a mask into three equal channels.
#[must_use]
pub fn mask_to_rgb(mask: &Mask) -> RgbImage {
    let gray = mask.as_image();
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}
