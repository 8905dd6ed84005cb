//! Binary pixel-selection masks.

use image::{GrayImage, Luma};

/// Value of a selected mask cell.
pub const SELECTED: u8 = 255;

/// A single-channel grid of selected (255) and unselected (0) cells.
///
/// Masks are immutable once built; combinators return new masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// A mask with no selected cells.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Select every cell of `source` for which `select` returns true.
    pub fn from_fn<P, F>(source: &image::ImageBuffer<P, Vec<P::Subpixel>>, mut select: F) -> Self
    where
        P: image::Pixel,
        F: FnMut(&P) -> bool,
    {
        let image = GrayImage::from_fn(source.width(), source.height(), |x, y| {
            Luma([if select(source.get_pixel(x, y)) { SELECTED } else { 0 }])
        });
        Self { image }
    }

    /// Treat any non-zero cell of `image` as selected.
    #[must_use]
    pub fn from_gray(mut image: GrayImage) -> Self {
        for px in image.pixels_mut() {
            if px[0] != 0 {
                px[0] = SELECTED;
            }
        }
        Self { image }
    }

    /// Mask width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Mask height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the cell at `(x, y)` is selected.
    #[must_use]
    pub fn is_selected(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    /// Number of selected cells.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.image.as_raw().iter().filter(|&&v| v != 0).count() as u64
    }

    /// Total number of cells.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Fraction of selected cells in `[0, 1]`; 0 for an empty grid.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        ratio(self.count(), self.area())
    }

    /// Cell-wise union with another mask of the same size.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a || b)
    }

    /// Cell-wise intersection with another mask of the same size.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a && b)
    }

    fn zip(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        debug_assert_eq!(self.image.dimensions(), other.image.dimensions());
        let mut image = self.image.clone();
        for (dst, src) in image.pixels_mut().zip(other.image.pixels()) {
            dst[0] = if op(dst[0] != 0, src[0] != 0) { SELECTED } else { 0 };
        }
        Self { image }
    }

    /// The mask as a grayscale image.
    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
