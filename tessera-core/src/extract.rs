//! Locating and normalizing the candidate pattern region of a capture.
//!
//! # Alignment model
//!
//! The extractor assumes the embedder's centering convention still holds in the
//! capture: the pattern sits at the geometric center of the image, axis-aligned.
//! Rotation, perspective skew and off-center framing are not corrected; captures
//! that violate the assumption produce a low score rather than an error.
//!
//! # Geometric normalization
//!
//! When the capture resolution differs from issuance resolution (declared through
//! `capture_scale`), the crop is resampled to the master's exact dimensions with a
//! bilinear (triangle) filter. Resampling blurs the high-frequency texture, so scaled
//! captures score measurably below unscaled ones; this is an accepted approximation.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::embed::centered_offset;
use crate::error::{Result, TesseraError};

/// Interpolation used by geometric normalization.
pub const NORMALIZATION_FILTER: FilterType = FilterType::Triangle;

/// Crop a `target_size × target_size` box around the image's geometric center.
pub fn extract(image: &GrayImage, target_size: u32) -> Result<GrayImage> {
    if target_size == 0 {
        return Err(TesseraError::InvalidImage("target size must be positive".into()));
    }
    if image.width() < target_size || image.height() < target_size {
        return Err(TesseraError::InvalidImage(format!(
            "Image {}x{} is smaller than the {}x{} pattern region",
            image.width(),
            image.height(),
            target_size,
            target_size
        )));
    }

    let (x, y) = centered_offset(image.dimensions(), (target_size, target_size));
    Ok(imageops::crop_imm(image, x, y, target_size, target_size).to_image())
}

/// Resample `crop` to exactly `width × height` using [`NORMALIZATION_FILTER`].
///
/// A crop that already has the requested dimensions is returned unchanged.
pub fn normalize(crop: GrayImage, width: u32, height: u32) -> GrayImage {
    if crop.dimensions() == (width, height) {
        return crop;
    }
    tracing::debug!(
        from_width = crop.width(),
        from_height = crop.height(),
        width,
        height,
        "Normalizing crop geometry"
    );
    imageops::resize(&crop, width, height, NORMALIZATION_FILTER)
}

/// Extraction policy applied to every capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extractor {
    capture_scale: f64,
}

impl Extractor {
    /// `capture_scale` is the ratio of capture pixels to issuance pixels
    /// (2.0 for a capture taken at twice the issued resolution).
    pub fn new(capture_scale: f64) -> Result<Self> {
        if !capture_scale.is_finite() || capture_scale <= 0.0 {
            return Err(TesseraError::InvalidConfig(format!(
                "capture scale must be a positive number, got {}",
                capture_scale
            )));
        }
        Ok(Self { capture_scale })
    }

    pub fn capture_scale(&self) -> f64 {
        self.capture_scale
    }

    /// Extract the candidate region and normalize it to `master`'s dimensions.
    pub fn candidate(&self, image: &GrayImage, master: (u32, u32)) -> Result<GrayImage> {
        let side = master.0.max(master.1) as f64 * self.capture_scale;
        let target_size = side.round().max(1.0) as u32;

        let crop = extract(image, target_size)?;
        Ok(normalize(crop, master.0, master.1))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self { capture_scale: 1.0 }
    }
}
