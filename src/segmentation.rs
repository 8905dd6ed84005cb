//! Color classification of substance pixels.
//!
//! Each profile yields a mask of the HSV pixels inside its range. Masks are
//! then merged according to [`MaskSelection`]:
//! - **Union**: every profile contributes.
//! - **Largest**: the single profile mask with the most pixels wins outright.
//!   Ties keep the earlier profile. If no profile matches anything the
//!   result is an empty mask and no profile is reported.
//!
//! Either result may then be cleaned with a morphological closing (dilate then
//! erode over a square neighborhood). Closing only ever adds pixels.

use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::color::{ColorProfile, ColorRange, HsvImage};
use crate::config::MaskSelection;
use crate::mask::Mask;

/// Output of the color classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Selected substance pixels.
    pub mask: Mask,
    /// Fraction of selected pixels in `[0, 1]`.
    pub coverage: f64,
    /// Winning profile name (largest-mask mode with a non-empty match only).
    pub profile: Option<String>,
}

/// Mask of the pixels of `hsv` inside `range`.
#[must_use]
pub fn profile_mask(hsv: &HsvImage, range: &ColorRange) -> Mask {
    Mask::from_fn(hsv, |px| range.contains(px.0))
}

/// Classify every pixel of `hsv` against `profiles`.
///
/// `closing_kernel` is the side of the square closing neighborhood, or `None`
/// to skip the closing.
#[must_use]
pub fn classify(
    hsv: &HsvImage,
    profiles: &[ColorProfile],
    selection: MaskSelection,
    closing_kernel: Option<u8>,
) -> Segmentation {
    let (width, height) = hsv.dimensions();

    let (mask, profile) = match selection {
        MaskSelection::Union => {
            let merged = profiles.iter().fold(Mask::empty(width, height), |acc, p| {
                let mask = profile_mask(hsv, &p.range);
                tracing::trace!(profile = %p.name, pixels = mask.count(), "profile mask");
                acc.union(&mask)
            });
            (merged, None)
        }
        MaskSelection::Largest => {
            let mut best: Option<(Mask, u64, &str)> = None;
            for p in profiles {
                let mask = profile_mask(hsv, &p.range);
                let count = mask.count();
                tracing::trace!(profile = %p.name, pixels = count, "profile mask");
                if count > best.as_ref().map_or(0, |(_, c, _)| *c) {
                    best = Some((mask, count, p.name.as_str()));
                }
            }
            match best {
                Some((mask, _, name)) => (mask, Some(name.to_string())),
                None => (Mask::empty(width, height), None),
            }
        }
    };

    let mask = match closing_kernel {
        Some(size) => close(&mask, size),
        None => mask,
    };
    let coverage = mask.coverage();
    Segmentation {
        mask,
        coverage,
        profile,
    }
}

/// Morphological closing over a `size` x `size` square neighborhood.
///
/// The result is a superset of `mask`: the erosion step near a small image's
/// border cannot drop a pixel that was selected before closing.
#[must_use]
pub fn close(mask: &Mask, size: u8) -> Mask {
    let radius = size / 2;
    if radius == 0 {
        return mask.clone();
    }
    Mask::from_gray(morphology::close(mask.as_image(), Norm::LInf, radius)).union(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{default_profiles, HsvBounds};
    use image::Rgb;

    const YELLOW: [u8; 3] = [20, 220, 220];
    const GREEN: [u8; 3] = [60, 200, 200];
    const BLUE: [u8; 3] = [120, 200, 200];

    /// HSV image whose left `yellow_cols` columns are yellow, next `green_cols` green, rest blue.
    fn stripes(width: u32, height: u32, yellow_cols: u32, green_cols: u32) -> HsvImage {
        HsvImage::from_fn(width, height, |x, _| {
            if x < yellow_cols {
                Rgb(YELLOW)
            } else if x < yellow_cols + green_cols {
                Rgb(GREEN)
            } else {
                Rgb(BLUE)
            }
        })
    }

    #[test]
    fn union_merges_all_profiles() {
        let hsv = stripes(20, 10, 6, 4);
        let seg = classify(&hsv, &default_profiles(), MaskSelection::Union, None);
        assert_eq!(seg.mask.count(), 100);
        assert!((seg.coverage - 0.5).abs() < 1e-12);
        assert!(seg.profile.is_none());
    }

    #[test]
    fn largest_keeps_only_the_biggest_profile() {
        let hsv = stripes(20, 10, 6, 4);
        let seg = classify(&hsv, &default_profiles(), MaskSelection::Largest, None);
        assert_eq!(seg.mask.count(), 60);
        assert!((seg.coverage - 0.3).abs() < 1e-12);
        assert_eq!(seg.profile.as_deref(), Some("yellow"));
        assert!(!seg.mask.is_selected(7, 0));
    }

    #[test]
    fn largest_tie_keeps_earlier_profile() {
        let hsv = stripes(20, 10, 5, 5);
        let seg = classify(&hsv, &default_profiles(), MaskSelection::Largest, None);
        assert_eq!(seg.profile.as_deref(), Some("yellow"));
    }

    #[test]
    fn no_match_yields_empty_mask_in_both_modes() {
        let hsv = stripes(8, 8, 0, 0);
        for selection in [MaskSelection::Union, MaskSelection::Largest] {
            let seg = classify(&hsv, &default_profiles(), selection, Some(5));
            assert_eq!(seg.mask.count(), 0);
            assert!(seg.coverage.abs() < f64::EPSILON);
            assert!(seg.profile.is_none());
        }
    }

    #[test]
    fn wrapping_profile_selects_second_subrange() {
        let profiles = vec![ColorProfile::wrapping(
            "red",
            HsvBounds::new([0, 100, 100], [10, 255, 255]),
            HsvBounds::new([170, 100, 100], [180, 255, 255]),
        )];
        let hsv = HsvImage::from_fn(4, 1, |x, _| match x {
            0 => Rgb([5, 200, 200]),
            1 => Rgb([175, 200, 200]),
            _ => Rgb([90, 200, 200]),
        });
        let seg = classify(&hsv, &profiles, MaskSelection::Union, None);
        assert!(seg.mask.is_selected(0, 0));
        assert!(seg.mask.is_selected(1, 0));
        assert!(!seg.mask.is_selected(2, 0));
        assert_eq!(seg.mask.count(), 2);
    }

    #[test]
    fn closing_fills_small_holes() {
        let mut hsv = HsvImage::from_pixel(15, 15, Rgb(YELLOW));
        hsv.put_pixel(7, 7, Rgb(BLUE));
        hsv.put_pixel(8, 7, Rgb(BLUE));

        let open = classify(&hsv, &default_profiles(), MaskSelection::Union, None);
        assert_eq!(open.mask.count(), 15 * 15 - 2);

        let closed = classify(&hsv, &default_profiles(), MaskSelection::Union, Some(5));
        assert_eq!(closed.mask.count(), 15 * 15);
    }

    #[test]
    fn closing_keeps_full_and_empty_masks() {
        let full = Mask::from_gray(image::GrayImage::from_pixel(9, 9, image::Luma([255])));
        assert_eq!(close(&full, 5), full);

        let empty = Mask::empty(9, 9);
        assert_eq!(close(&empty, 5), empty);
    }

    #[test]
    fn closing_never_drops_pixels_of_masks_smaller_than_the_kernel() {
        for (w, h) in [(1, 1), (2, 1), (1, 3), (2, 2)] {
            let full = Mask::from_gray(image::GrayImage::from_pixel(w, h, image::Luma([255])));
            assert_eq!(close(&full, 5).count(), full.count(), "{w}x{h}");
        }

        let corner = Mask::from_gray(image::GrayImage::from_fn(3, 3, |x, y| {
            image::Luma([u8::from(x == 0 && y == 0)])
        }));
        assert!(close(&corner, 5).is_selected(0, 0));
    }

    #[test]
    fn one_pixel_substance_survives_closing() {
        let hsv = HsvImage::from_pixel(1, 1, Rgb(YELLOW));
        let seg = classify(&hsv, &default_profiles(), MaskSelection::Union, Some(5));
        assert_eq!(seg.mask.count(), 1);
        assert!((seg.coverage - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closing_applies_to_the_largest_mask() {
        let mut hsv = HsvImage::from_pixel(15, 15, Rgb(YELLOW));
        hsv.put_pixel(7, 7, Rgb(BLUE));

        let open = classify(&hsv, &default_profiles(), MaskSelection::Largest, None);
        assert_eq!(open.mask.count(), 15 * 15 - 1);

        let closed = classify(&hsv, &default_profiles(), MaskSelection::Largest, Some(5));
        assert_eq!(closed.mask.count(), 15 * 15);
        assert_eq!(closed.profile.as_deref(), Some("yellow"));
    }
}
