//! Color-space conversion and HSV color profiles.
//!
//! HSV values follow the 8-bit convention used by most vision toolkits:
//! hue is halved to fit a byte (`0..=180`), saturation and value span `0..=255`.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// An image whose three channels hold hue, saturation and value.
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Largest hue value in the halved-degree convention.
pub const MAX_HUE: u8 = 180;

/// Convert one RGB sample to `[h, s, v]`.
#[must_use]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let h = if diff <= 0.0 {
        0.0
    } else if (v - r).abs() < f32::EPSILON {
        60.0 * (g - b) / diff
    } else if (v - g).abs() < f32::EPSILON {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        [
            (h / 2.0).round().min(f32::from(MAX_HUE)) as u8,
            s.round().clamp(0.0, 255.0) as u8,
            v as u8,
        ]
    }
}

/// Luminance of one RGB sample: `0.299*R + 0.587*G + 0.114*B`, rounded.
#[must_use]
pub fn luminance(rgb: [u8; 3]) -> u8 {
    let lum = 0.299 * f32::from(rgb[0]) + 0.587 * f32::from(rgb[1]) + 0.114 * f32::from(rgb[2]);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        lum.round().clamp(0.0, 255.0) as u8
    }
}

/// Convert a whole RGB image to HSV.
#[must_use]
pub fn to_hsv(image: &RgbImage) -> HsvImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Rgb(rgb_to_hsv(image.get_pixel(x, y).0))
    })
}

/// Convert a whole RGB image to grayscale intensity.
#[must_use]
pub fn to_gray(image: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Luma([luminance(image.get_pixel(x, y).0)])
    })
}

/// Inclusive lower/upper bounds over `[h, s, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBounds {
    /// Lower bound per channel (inclusive).
    pub lower: [u8; 3],
    /// Upper bound per channel (inclusive).
    pub upper: [u8; 3],
}

impl HsvBounds {
    /// Create bounds from a lower and upper `[h, s, v]` triple.
    #[must_use]
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Whether every channel of `hsv` lies within the bounds.
    #[inline]
    #[must_use]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }

    fn check(&self, profile: &str) -> Result<(), String> {
        for c in 0..3 {
            if self.lower[c] > self.upper[c] {
                return Err(format!(
                    "profile '{profile}': lower bound {:?} exceeds upper bound {:?}",
                    self.lower, self.upper
                ));
            }
        }
        if self.upper[0] > MAX_HUE {
            return Err(format!(
                "profile '{profile}': hue bound {} exceeds {MAX_HUE}",
                self.upper[0]
            ));
        }
        Ok(())
    }
}

/// The HSV region a profile selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColorRange {
    /// A single lower/upper pair.
    Simple(HsvBounds),
    /// Two pairs joined by union, for hues that wrap past the circular boundary.
    Wrapping {
        /// The two sub-ranges, e.g. `0..=10` and `170..=180` for red.
        ranges: [HsvBounds; 2],
    },
}

impl ColorRange {
    /// Whether `hsv` falls inside this range (either sub-range when wrapping).
    #[inline]
    #[must_use]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        match self {
            Self::Simple(bounds) => bounds.contains(hsv),
            Self::Wrapping { ranges } => ranges.iter().any(|b| b.contains(hsv)),
        }
    }

    pub(crate) fn check(&self, profile: &str) -> Result<(), String> {
        match self {
            Self::Simple(bounds) => bounds.check(profile),
            Self::Wrapping { ranges } => ranges.iter().try_for_each(|b| b.check(profile)),
        }
    }
}

/// A named substance color variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorProfile {
    /// Profile name, unique within a configuration.
    pub name: String,
    /// The HSV region this profile selects.
    pub range: ColorRange,
}

impl ColorProfile {
    /// A profile with a single HSV range.
    #[must_use]
    pub fn simple(name: impl Into<String>, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            range: ColorRange::Simple(HsvBounds::new(lower, upper)),
        }
    }

    /// A profile whose hue range wraps, given as two sub-ranges.
    #[must_use]
    pub fn wrapping(name: impl Into<String>, first: HsvBounds, second: HsvBounds) -> Self {
        Self {
            name: name.into(),
            range: ColorRange::Wrapping {
                ranges: [first, second],
            },
        }
    }
}

/// The built-in profile set: yellow, red, green and brown.
#[must_use]
pub fn default_profiles() -> Vec<ColorProfile> {
    vec![
        ColorProfile::simple("yellow", [15, 100, 100], [25, 255, 255]),
        ColorProfile::wrapping(
            "red",
            HsvBounds::new([0, 100, 100], [10, 255, 255]),
            HsvBounds::new([170, 100, 100], [180, 255, 255]),
        ),
        ColorProfile::simple("green", [40, 80, 80], [80, 255, 255]),
        ColorProfile::simple("brown", [10, 50, 50], [20, 200, 200]),
    ]
}
