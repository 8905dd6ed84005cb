//! Validated input frames.

use std::path::Path;

use image::{imageops::FilterType, GrayImage, RgbImage};

use crate::color::{self, HsvImage};
use crate::error::{Error, Result};

/// A decoded color frame with positive width and height.
///
/// Pixels are stored in RGB order internally; [`Frame::from_bgr`] accepts the
/// blue-green-red byte order that capture devices commonly hand out.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wrap an already decoded RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] if the image has zero area.
    pub fn from_image(image: RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(invalid(width, height, "zero area"));
        }
        Ok(Self { image })
    }

    /// Build a frame from tightly packed RGB bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] for zero area or a buffer whose length
    /// is not `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_buffer(width, height, data.len())?;
        let image = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| invalid(width, height, "buffer does not fit dimensions"))?;
        Self::from_image(image)
    }

    /// Build a frame from tightly packed BGR bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Frame::from_rgb`].
    pub fn from_bgr(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        check_buffer(width, height, data.len())?;
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Self::from_rgb(width, height, data)
    }

    /// Decode a frame from encoded container bytes (JPEG, PNG, ...).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes cannot be decoded and
    /// [`Error::InvalidFrame`] if the decoded image is empty.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).map_err(Error::Decode)?;
        Self::from_image(img.to_rgb8())
    }

    /// Load and decode a frame from an image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as [`Frame::decode`].
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Total pixel count.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// The underlying RGB image.
    #[must_use]
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Resample to `width` x `height` with bilinear filtering.
    ///
    /// Returns the frame unchanged when it already has that size.
    #[must_use]
    pub fn resized(self, width: u32, height: u32) -> Self {
        if self.image.dimensions() == (width, height) {
            return self;
        }
        Self {
            image: image::imageops::resize(&self.image, width, height, FilterType::Triangle),
        }
    }

    /// HSV representation of the frame.
    #[must_use]
    pub fn to_hsv(&self) -> HsvImage {
        color::to_hsv(&self.image)
    }

    /// Grayscale intensity representation of the frame.
    #[must_use]
    pub fn to_gray(&self) -> GrayImage {
        color::to_gray(&self.image)
    }
}

fn invalid(width: u32, height: u32, reason: &str) -> Error {
    Error::InvalidFrame {
        width,
        height,
        reason: reason.to_string(),
    }
}

fn check_buffer(width: u32, height: u32, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(invalid(width, height, "zero area"));
    }
    let expected = u64::from(width) * u64::from(height) * 3;
    if len as u64 != expected {
        return Err(invalid(
            width,
            height,
            &format!("expected {expected} bytes, got {len}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_is_rejected() {
        let err = Frame::from_image(RgbImage::new(0, 10)).unwrap_err();
        assert!(err.is_invalid_frame());

        let err = Frame::from_rgb(10, 0, Vec::new()).unwrap_err();
        assert!(err.is_invalid_frame());
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = Frame::from_bgr(4, 4, vec![0; 4 * 4 * 3 - 1]).unwrap_err();
        assert!(err.to_string().contains("expected 48 bytes, got 47"));
    }

    #[test]
    fn bgr_bytes_are_reordered() {
        let frame = Frame::from_bgr(1, 1, vec![10, 20, 30]).unwrap();
        assert_eq!(frame.as_rgb().get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Frame::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.is_invalid_frame());
    }

    #[test]
    fn resize_changes_dimensions_only_when_needed() {
        let frame = Frame::from_image(RgbImage::new(8, 6)).unwrap();
        let same = frame.clone().resized(8, 6);
        assert_eq!(same, frame);

        let scaled = frame.resized(4, 3);
        assert_eq!((scaled.width(), scaled.height()), (4, 3));
        assert_eq!(scaled.pixel_count(), 12);
    }
}
