//! Compositing a master pattern into the center of a scannable symbol.
//!
//! The pattern overwrites a square of modules in the middle of the symbol. That
//! damage is absorbed by the symbol's own error correction, which is why the
//! embedder refuses any style below [`ErrorCorrection::High`].

use image::{imageops, GrayImage, Luma};

use crate::error::{Result, TesseraError, PATTERN_SIZE};
use crate::symbol::{render_symbol, ErrorCorrection, PayloadDecoder, RqrrDecoder, SymbolStyle};

/// Same length and shape as every issued identifier, so the sample symbol has
/// the same version and module count as a real one.
const SAMPLE_PAYLOAD: &str = "00000000-0000-4000-8000-000000000000";

/// Largest share of the symbol's modules the pattern may cover. High error
/// correction restores ~30% of codewords; scattered damage touches more
/// codewords than modules, so the bound sits well below that.
const MAX_MODULE_COVERAGE: f64 = 0.15;

/// Top-left offset of a `inner`-sized box centered inside `outer`.
///
/// Integer division rounds toward the top-left; the extractor uses the same
/// convention so an unscaled capture crops exactly the embedded pixels.
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Overwrite the centered `pattern`-sized region of `symbol` with `pattern`.
pub fn embed(symbol: &GrayImage, pattern: &GrayImage) -> Result<GrayImage> {
    if pattern.width() > symbol.width() || pattern.height() > symbol.height() {
        return Err(TesseraError::InvalidImage(format!(
            "Pattern {}x{} does not fit inside symbol {}x{}",
            pattern.width(),
            pattern.height(),
            symbol.width(),
            symbol.height()
        )));
    }

    let (x, y) = centered_offset(symbol.dimensions(), pattern.dimensions());
    let mut composite = symbol.clone();
    imageops::replace(&mut composite, pattern, x as i64, y as i64);
    Ok(composite)
}

/// Produces distributable composites for registered identifiers.
#[derive(Debug, Clone, Copy)]
pub struct Embedder {
    style: SymbolStyle,
}

impl Embedder {
    /// Create an embedder rendering symbols in `style`.
    ///
    /// Anything below high error correction would leave the overwritten center
    /// unrecoverable, so it is rejected here rather than at scan time.
    pub fn new(style: SymbolStyle) -> Result<Self> {
        if style.error_correction != ErrorCorrection::High {
            return Err(TesseraError::InvalidConfig(format!(
                "Embedding requires High error correction, got {:?}",
                style.error_correction
            )));
        }
        if style.module_px == 0 {
            return Err(TesseraError::InvalidConfig(
                "module size must be at least one pixel".into(),
            ));
        }
        check_decodable(&style)?;
        Ok(Self { style })
    }

    pub fn style(&self) -> &SymbolStyle {
        &self.style
    }

    /// Render a symbol for `unique_id` and embed `pattern` in its center.
    pub fn issue(&self, unique_id: &str, pattern: &GrayImage) -> Result<GrayImage> {
        let symbol = render_symbol(unique_id, &self.style)?;
        let composite = embed(&symbol, pattern)?;

        tracing::debug!(
            unique_id,
            side = composite.width(),
            pattern = pattern.width(),
            "Issued composite"
        );
        Ok(composite)
    }
}

/// Issue a sample composite in `style` and require it to scan back.
///
/// Small modules make the pattern cover more of the symbol than error correction
/// can absorb; that is a deployment mistake and must fail at startup.
fn check_decodable(style: &SymbolStyle) -> Result<()> {
    let symbol = render_symbol(SAMPLE_PAYLOAD, style)?;
    if symbol.width() < PATTERN_SIZE || symbol.height() < PATTERN_SIZE {
        return Err(TesseraError::InvalidConfig(format!(
            "{}px modules give a {}x{} symbol, too small for a {}x{} pattern",
            style.module_px,
            symbol.width(),
            symbol.height(),
            PATTERN_SIZE,
            PATTERN_SIZE
        )));
    }

    let modules = symbol.width() / style.module_px - 2 * style.quiet_zone;
    let covered = PATTERN_SIZE.div_ceil(style.module_px);
    let coverage = f64::from(covered * covered) / f64::from(modules * modules);
    if coverage > MAX_MODULE_COVERAGE {
        return Err(TesseraError::InvalidConfig(format!(
            "{}px modules let the pattern cover {:.0}% of the symbol (limit {:.0}%)",
            style.module_px,
            coverage * 100.0,
            MAX_MODULE_COVERAGE * 100.0
        )));
    }

    let composite = embed(&symbol, &sample_pattern())?;
    let decoded = RqrrDecoder.decode(&composite);
    if decoded.first().map(String::as_str) != Some(SAMPLE_PAYLOAD) {
        return Err(TesseraError::InvalidConfig(format!(
            "{}px modules leave the pattern covering too much of the symbol to scan",
            style.module_px
        )));
    }
    Ok(())
}

/// Fixed high-contrast texture standing in for a random master pattern.
fn sample_pattern() -> GrayImage {
    let mut state: u32 = 0x9E37_79B9;
    GrayImage::from_fn(PATTERN_SIZE, PATTERN_SIZE, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Luma([(state >> 24) as u8])
    })
}

impl Default for Embedder {
    fn default() -> Self {
        Self {
            style: SymbolStyle::default(),
        }
    }
}
