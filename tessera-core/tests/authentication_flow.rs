//! End-to-end issuance and verification tests.
//!
//! Each test issues a product through the registry, renders its distributable
//! composite, applies a transformation standing in for print-and-capture or
//! counterfeiting, and checks the verdict.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use tessera_core::{
    centered_offset, decode_png, encode_png, DecisionPolicy, Embedder, EntropySource, Extractor,
    MockEntropy, PatternGenerator, ProductRecord, Registry, TesseraError, Verdict, Verifier,
    PATTERN_SIZE,
};

fn registry() -> Registry {
    Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())))
}

/// Register a product and return its record with the issued composite.
async fn issue(registry: &Registry) -> (ProductRecord, GrayImage) {
    let record = registry.create("Chronograph", "Maison Horlogère").await.unwrap();
    let png = registry.get_master_pattern(&record.unique_id).await.unwrap();
    let master = decode_png(&png, PATTERN_SIZE).unwrap();
    let composite = Embedder::default()
        .issue(&record.unique_id, &master)
        .unwrap();
    (record, composite)
}

/// Overwrite the embedded pattern region with independent noise.
fn replace_center_with_noise(composite: &GrayImage, seed: u64) -> GrayImage {
    let mut samples = vec![0u8; (PATTERN_SIZE * PATTERN_SIZE) as usize];
    MockEntropy::new(seed).fill_bytes(&mut samples).unwrap();
    let noise = GrayImage::from_raw(PATTERN_SIZE, PATTERN_SIZE, samples).unwrap();

    let (x, y) = centered_offset(composite.dimensions(), noise.dimensions());
    let mut forged = composite.clone();
    imageops::replace(&mut forged, &noise, x as i64, y as i64);
    forged
}

fn png(image: &GrayImage) -> Vec<u8> {
    encode_png(image).unwrap()
}

#[tokio::test]
async fn test_issued_code_verifies_authentic() {
    let registry = registry();
    let (record, composite) = issue(&registry).await;

    let report = Verifier::new(registry).verify(png(&composite)).await.unwrap();

    assert_eq!(report.verdict, Verdict::Authentic);
    assert!(report.score.unwrap() >= 0.90);
    let product = report.product.expect("registered product is summarized");
    assert_eq!(product.unique_id, record.unique_id);
    assert_eq!(product.company_name, "Maison Horlogère");
}

#[tokio::test]
async fn test_brighter_capture_still_authentic() {
    let registry = registry();
    let (_, composite) = issue(&registry).await;

    let brighter = GrayImage::from_fn(composite.width(), composite.height(), |x, y| {
        Luma([composite.get_pixel(x, y)[0].saturating_add(15)])
    });

    let report = Verifier::new(registry).verify(png(&brighter)).await.unwrap();
    assert_eq!(report.verdict, Verdict::Authentic);
    assert!(report.score.unwrap() > 0.95);
}

#[tokio::test]
async fn test_replaced_pattern_is_counterfeit() {
    let registry = registry();
    let (record, composite) = issue(&registry).await;
    let forged = replace_center_with_noise(&composite, 0x5EED);

    let report = Verifier::new(registry).verify(png(&forged)).await.unwrap();

    assert_eq!(report.verdict, Verdict::Counterfeit);
    assert!(report.score.unwrap() < 0.5);
    // The code itself is genuine, so the product is still identified
    assert_eq!(report.product.unwrap().unique_id, record.unique_id);
}

#[tokio::test]
async fn test_unregistered_code_is_counterfeit() {
    let issuer = registry();
    let (_, composite) = issue(&issuer).await;

    // Verify against a registry that never issued this identifier
    let report = Verifier::new(registry()).verify(png(&composite)).await.unwrap();

    assert_eq!(report.verdict, Verdict::Counterfeit);
    assert!(report.message.contains("does not exist"));
    assert!(report.score.is_none());
    assert!(report.product.is_none());
}

#[tokio::test]
async fn test_non_scannable_image_is_rejected() {
    let verifier = Verifier::new(registry());

    let blank = GrayImage::from_pixel(400, 400, Luma([255]));
    let err = verifier.verify(png(&blank)).await.unwrap_err();
    assert!(matches!(err, TesseraError::InvalidImage(_)));

    let err = verifier.verify(b"GIF89a truncated".to_vec()).await.unwrap_err();
    assert!(matches!(err, TesseraError::InvalidImage(_)));
}

#[tokio::test]
async fn test_scaled_capture_uses_geometric_normalization() {
    let registry = registry();
    let (_, composite) = issue(&registry).await;
    let forged = replace_center_with_noise(&composite, 42);

    let upscale = |image: &GrayImage| {
        imageops::resize(
            image,
            image.width() * 2,
            image.height() * 2,
            FilterType::Nearest,
        )
    };

    // Resampling softens the texture, so scaled captures are judged on a lower threshold
    let verifier = Verifier::new(registry)
        .with_extractor(Extractor::new(2.0).unwrap())
        .with_policy(DecisionPolicy::new(0.7).unwrap());

    let genuine = verifier.verify(png(&upscale(&composite))).await.unwrap();
    assert_eq!(genuine.verdict, Verdict::Authentic);
    let genuine_score = genuine.score.unwrap();
    assert!(genuine_score < 1.0);

    let copy = verifier.verify(png(&upscale(&forged))).await.unwrap();
    assert_eq!(copy.verdict, Verdict::Counterfeit);
    assert!(copy.score.unwrap() < 0.3);
}

#[tokio::test]
async fn test_unscaled_extractor_on_scaled_capture_scores_low() {
    let registry = registry();
    let (_, composite) = issue(&registry).await;
    let scaled = imageops::resize(
        &composite,
        composite.width() * 2,
        composite.height() * 2,
        FilterType::Nearest,
    );

    let report = Verifier::new(registry).verify(png(&scaled)).await.unwrap();
    assert_eq!(report.verdict, Verdict::Counterfeit);
}

#[tokio::test]
async fn test_verification_is_repeatable() {
    let registry = registry();
    let (_, composite) = issue(&registry).await;
    let verifier = Verifier::new(registry);

    let first = verifier.verify(png(&composite)).await.unwrap();
    let second = verifier.verify(png(&composite)).await.unwrap();
    assert_eq!(first, second);
}
