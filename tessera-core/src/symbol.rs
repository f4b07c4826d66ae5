//! Adapter over the scannable-code codec.
//!
//! Symbol-level encoding and error correction are delegated to external crates:
//! `qrcode` renders payloads, `rqrr` reads them back. This module only fixes the
//! raster conventions (module size, quiet zone, grayscale) and the decoder contract:
//! a captured raster yields zero or more payloads in decoder order.

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use rqrr::PreparedImage;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

/// Error-correction level of a rendered symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% of codewords recoverable
    Low,
    /// ~15% of codewords recoverable
    Medium,
    /// ~25% of codewords recoverable
    Quartile,
    /// ~30% of codewords recoverable; the only level that leaves room for a pattern
    #[default]
    High,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

/// Raster layout of a rendered symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolStyle {
    /// Side length of one module, in pixels
    pub module_px: u32,
    /// Width of the light border, in modules
    pub quiet_zone: u32,
    /// Error-correction level used when encoding
    pub error_correction: ErrorCorrection,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            module_px: 10,
            quiet_zone: 4,
            error_correction: ErrorCorrection::High,
        }
    }
}

/// Render `payload` as a black-on-white grayscale symbol.
pub fn render_symbol(payload: &str, style: &SymbolStyle) -> Result<GrayImage> {
    if style.module_px == 0 {
        return Err(TesseraError::InvalidConfig(
            "module size must be at least one pixel".into(),
        ));
    }

    let code =
        QrCode::with_error_correction_level(payload.as_bytes(), style.error_correction.into())
            .map_err(|e| TesseraError::Codec(format!("Cannot encode payload: {}", e)))?;

    let modules = code.width() as u32;
    let side = (modules + 2 * style.quiet_zone) * style.module_px;
    let mut symbol = GrayImage::from_pixel(side, side, Luma([255]));

    for y in 0..modules {
        for x in 0..modules {
            if code[(x as usize, y as usize)] != Color::Dark {
                continue;
            }
            let px = (style.quiet_zone + x) * style.module_px;
            let py = (style.quiet_zone + y) * style.module_px;
            for dy in 0..style.module_px {
                for dx in 0..style.module_px {
                    symbol.put_pixel(px + dx, py + dy, Luma([0]));
                }
            }
        }
    }

    tracing::debug!(modules, side, "Rendered symbol");
    Ok(symbol)
}

/// Reads textual payloads out of a captured raster.
pub trait PayloadDecoder: Send + Sync {
    /// Return every payload found, in decoder order. An empty vector means the
    /// raster holds no readable symbol.
    fn decode(&self, image: &GrayImage) -> Vec<String>;
}

/// Payload decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl PayloadDecoder for RqrrDecoder {
    fn decode(&self, image: &GrayImage) -> Vec<String> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            image.get_pixel(x as u32, y as u32)[0]
        });

        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_meta, content)) => Some(content),
                Err(e) => {
                    tracing::debug!(error = ?e, "Skipping undecodable grid");
                    None
                }
            })
            .collect()
    }
}

/// Load raw capture bytes (PNG, JPEG, GIF or WebP) as a grayscale raster.
pub fn load_capture(bytes: &[u8]) -> Result<GrayImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| TesseraError::InvalidImage(format!("Failed to decode image: {}", e)))?;
    Ok(image.into_luma8())
}

/// Read the payload a capture was issued for.
///
/// Zero payloads is an `InvalidImage`; when several symbols are visible the first
/// one reported by the decoder wins and the rest are ignored.
pub fn read_payload(decoder: &dyn PayloadDecoder, image: &GrayImage) -> Result<String> {
    let mut payloads = decoder.decode(image);
    if payloads.is_empty() {
        return Err(TesseraError::InvalidImage(
            "No scannable code found in the image".into(),
        ));
    }
    if payloads.len() > 1 {
        tracing::debug!(
            count = payloads.len(),
            "Multiple payloads decoded, using the first"
        );
    }
    Ok(payloads.swap_remove(0))
}
