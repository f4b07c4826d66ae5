//! Structural similarity between a master pattern and a candidate crop.
//!
//! # Algorithm
//!
//! Mean SSIM over every 7×7 window fully inside the raster, with a uniform window,
//! sample (N−1) statistics, `K1 = 0.01`, `K2 = 0.03` and an 8-bit data range:
//!
//! ```text
//! SSIM(x, y) = (2·μx·μy + C1)(2·σxy + C2) / ((μx² + μy² + C1)(σx² + σy² + C2))
//! ```
//!
//! The luminance term absorbs uniform brightness shifts from photography while the
//! structure term collapses toward zero for an independently generated texture.
//! Identical inputs score exactly `1.0`: both factors of numerator and denominator
//! are computed from the same floating-point values.

use image::GrayImage;

use crate::error::{Result, TesseraError};

/// Side length of the sliding window.
pub const WINDOW_SIZE: u32 = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Computes structural similarity scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `candidate` against `master`, in `[-1, 1]` (realistically `[0, 1]`).
    pub fn score(&self, master: &GrayImage, candidate: &GrayImage) -> Result<f64> {
        ssim(master, candidate)
    }
}

/// Mean structural similarity of two equally sized grayscale rasters.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(TesseraError::ComparisonError(format!(
            "Shape mismatch: {}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }

    let (width, height) = a.dimensions();
    if width < WINDOW_SIZE || height < WINDOW_SIZE {
        return Err(TesseraError::ComparisonError(format!(
            "Raster {}x{} is smaller than the {}x{} window",
            width, height, WINDOW_SIZE, WINDOW_SIZE
        )));
    }

    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut windows = 0u64;

    for top in 0..=(height - WINDOW_SIZE) {
        for left in 0..=(width - WINDOW_SIZE) {
            let stats = WindowStats::collect(a, b, left, top);

            let numerator = (2.0 * stats.mean_a * stats.mean_b + c1) * (2.0 * stats.cov + c2);
            let denominator = (stats.mean_a * stats.mean_a + stats.mean_b * stats.mean_b + c1)
                * (stats.var_a + stats.var_b + c2);

            total += numerator / denominator;
            windows += 1;
        }
    }

    Ok(total / windows as f64)
}

/// First and second moments of one window pair.
struct WindowStats {
    mean_a: f64,
    mean_b: f64,
    var_a: f64,
    var_b: f64,
    cov: f64,
}

impl WindowStats {
    fn collect(a: &GrayImage, b: &GrayImage, left: u32, top: u32) -> Self {
        let n = (WINDOW_SIZE * WINDOW_SIZE) as f64;

        let window = |img: &GrayImage| -> Vec<f64> {
            let mut samples = Vec::with_capacity((WINDOW_SIZE * WINDOW_SIZE) as usize);
            for y in top..top + WINDOW_SIZE {
                for x in left..left + WINDOW_SIZE {
                    samples.push(img.get_pixel(x, y)[0] as f64);
                }
            }
            samples
        };

        let xs = window(a);
        let ys = window(b);

        let mean_a = xs.iter().sum::<f64>() / n;
        let mean_b = ys.iter().sum::<f64>() / n;

        let covariance = |p: &[f64], mp: f64, q: &[f64], mq: f64| -> f64 {
            p.iter()
                .zip(q)
                .map(|(u, v)| (u - mp) * (v - mq))
                .sum::<f64>()
                / (n - 1.0)
        };

        Self {
            mean_a,
            mean_b,
            var_a: covariance(&xs, mean_a, &xs, mean_a),
            var_b: covariance(&ys, mean_b, &ys, mean_b),
            cov: covariance(&xs, mean_a, &ys, mean_b),
        }
    }
}
