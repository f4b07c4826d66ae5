//! Master pattern generation and persistence encoding.
//!
//! A master pattern is a square matrix of independent, uniformly distributed 8-bit
//! luminance samples. It is generated exactly once per product, persisted as a
//! lossless single-channel PNG, and never regenerated: issuing a new pattern for an
//! existing identifier would silently invalidate every printed unit.

use std::io::Cursor;
use std::sync::Arc;

use image::{ColorType, GrayImage, ImageFormat};
use sha3::{Digest, Sha3_256};

use crate::entropy::EntropySource;
use crate::error::{Result, TesseraError};

/// Draws fresh master patterns from an injected entropy source.
#[derive(Clone)]
pub struct PatternGenerator {
    entropy: Arc<dyn EntropySource>,
}

impl PatternGenerator {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Generate a `size × size` grayscale pattern.
    ///
    /// Every byte of entropy becomes exactly one pixel, so cells are independent and
    /// uniform over `[0, 255]` whenever the source is.
    pub fn generate(&self, size: u32) -> Result<GrayImage> {
        let mut samples = vec![0u8; (size as usize) * (size as usize)];
        self.entropy.fill_bytes(&mut samples)?;

        tracing::debug!(size, source = %self.entropy.source_id(), "Generated master pattern");

        GrayImage::from_raw(size, size, samples)
            .ok_or_else(|| TesseraError::Entropy("pattern buffer size mismatch".into()))
    }
}

impl std::fmt::Debug for PatternGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternGenerator")
            .field("source", &self.entropy.source_id())
            .finish()
    }
}

/// Encode a pattern as a lossless 8-bit grayscale PNG.
pub fn encode_png(pattern: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    pattern
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| TesseraError::Storage(format!("Failed to encode pattern PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Decode a persisted master pattern.
///
/// The raster must be a single-channel 8-bit PNG of exactly `size × size` pixels;
/// anything else cannot be compared and is reported as a `ComparisonError`.
pub fn decode_png(bytes: &[u8], size: u32) -> Result<GrayImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| TesseraError::ComparisonError(format!("Unreadable master pattern: {}", e)))?;

    if image.color() != ColorType::L8 {
        return Err(TesseraError::ComparisonError(format!(
            "Master pattern must be 8-bit grayscale, got {:?}",
            image.color()
        )));
    }

    let pattern = image.into_luma8();
    if pattern.dimensions() != (size, size) {
        return Err(TesseraError::ComparisonError(format!(
            "Master pattern is {}x{}, expected {}x{}",
            pattern.width(),
            pattern.height(),
            size,
            size
        )));
    }

    Ok(pattern)
}

/// SHA3-256 digest of persisted pattern bytes, hex-encoded.
pub fn pattern_digest(png: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(png);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{MockEntropy, OsEntropy};
    use crate::error::PATTERN_SIZE;

    fn os_generator() -> PatternGenerator {
        PatternGenerator::new(Arc::new(OsEntropy::new()))
    }

    #[test]
    fn test_generated_pattern_dimensions() {
        let pattern = os_generator().generate(PATTERN_SIZE).unwrap();
        assert_eq!(pattern.dimensions(), (48, 48));
        assert_eq!(pattern.as_raw().len(), 48 * 48);
    }

    /// Chi-square goodness of fit against the uniform distribution on [0, 255].
    ///
    /// With 255 degrees of freedom the statistic has mean 255 and standard deviation
    /// ~22.6; 340 sits beyond the 0.9999 quantile.
    #[test]
    fn test_pattern_values_uniform() {
        let generator = os_generator();
        let mut histogram = [0u64; 256];
        let mut total = 0u64;

        for _ in 0..4 {
            let pattern = generator.generate(PATTERN_SIZE).unwrap();
            for &v in pattern.as_raw() {
                histogram[v as usize] += 1;
                total += 1;
            }
        }

        let expected = total as f64 / 256.0;
        let chi_square: f64 = histogram
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        assert!(
            chi_square < 340.0,
            "Histogram deviates from uniform (chi-square: {:.1})",
            chi_square
        );
    }

    /// Lag-1 autocorrelation along rows should vanish for independent samples.
    #[test]
    fn test_pattern_values_independent() {
        let pattern = os_generator().generate(PATTERN_SIZE).unwrap();
        let samples: Vec<f64> = pattern.as_raw().iter().map(|&v| v as f64).collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
        let lagged: f64 = samples
            .windows(2)
            .map(|w| (w[0] - mean) * (w[1] - mean))
            .sum();
        let correlation = lagged / variance;

        // Standard error is ~1/sqrt(2304) = 0.021
        assert!(
            correlation.abs() < 0.1,
            "Adjacent samples are correlated (r = {:.3})",
            correlation
        );
    }

    #[test]
    fn test_generate_uses_fresh_entropy_each_call() {
        let generator = PatternGenerator::new(Arc::new(MockEntropy::default()));
        let first = generator.generate(PATTERN_SIZE).unwrap();
        let second = generator.generate(PATTERN_SIZE).unwrap();
        assert_ne!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_png_is_lossless_grayscale() {
        let pattern = os_generator().generate(PATTERN_SIZE).unwrap();
        let png = encode_png(&pattern).unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let decoded = decode_png(&png, PATTERN_SIZE).unwrap();
        assert_eq!(decoded.as_raw(), pattern.as_raw());
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let pattern = os_generator().generate(32).unwrap();
        let png = encode_png(&pattern).unwrap();

        let err = decode_png(&png, PATTERN_SIZE).unwrap_err();
        assert!(matches!(err, TesseraError::ComparisonError(_)));
    }

    #[test]
    fn test_decode_rejects_color_raster() {
        let rgb = image::RgbImage::new(PATTERN_SIZE, PATTERN_SIZE);
        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, ImageFormat::Png).unwrap();

        let err = decode_png(buffer.get_ref(), PATTERN_SIZE).unwrap_err();
        assert!(matches!(err, TesseraError::ComparisonError(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_png(b"definitely not a png", PATTERN_SIZE).unwrap_err();
        assert!(matches!(err, TesseraError::ComparisonError(_)));
    }

    #[test]
    fn test_pattern_digest_is_stable() {
        let digest = pattern_digest(b"pattern bytes");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, pattern_digest(b"pattern bytes"));
        assert_ne!(digest, pattern_digest(b"other bytes"));
    }
}
