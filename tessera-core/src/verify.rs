//! Verification of captured images against the registry.
//!
//! Decoding, extraction and scoring are CPU-bound and run on the blocking thread
//! pool; only registry lookups run on the async executor.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::{DecisionPolicy, Evidence, Verdict};
use crate::error::{Result, TesseraError};
use crate::extract::Extractor;
use crate::pattern::decode_png;
use crate::registry::{ProductRecord, Registry};
use crate::similarity::SimilarityScorer;
use crate::symbol::{load_capture, read_payload, PayloadDecoder, RqrrDecoder};

/// Public description of the product a capture was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub unique_id: String,
    pub product_name: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProductRecord> for ProductSummary {
    fn from(record: &ProductRecord) -> Self {
        Self {
            unique_id: record.unique_id.clone(),
            product_name: record.product_name.clone(),
            company_name: record.company_name.clone(),
            created_at: record.created_at,
        }
    }
}

/// Outcome of verifying one capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verdict: Verdict,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Present whenever the decoded identifier is registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

/// Runs the verification flow: decode, look up, extract, score, decide.
#[derive(Clone)]
pub struct Verifier {
    registry: Registry,
    decoder: Arc<dyn PayloadDecoder>,
    extractor: Extractor,
    scorer: SimilarityScorer,
    policy: DecisionPolicy,
}

impl Verifier {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            decoder: Arc::new(RqrrDecoder),
            extractor: Extractor::default(),
            scorer: SimilarityScorer::new(),
            policy: DecisionPolicy::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn PayloadDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Verify raw capture bytes.
    ///
    /// Returns `InvalidImage` when no identifier can be read (no verdict is given)
    /// and `Storage` when the registry itself fails. Every other outcome, including
    /// comparison failures, is a verdict.
    pub async fn verify(&self, capture: Vec<u8>) -> Result<VerificationReport> {
        let decoder = self.decoder.clone();
        let (image, unique_id) = tokio::task::spawn_blocking(move || {
            let image = load_capture(&capture)?;
            let unique_id = read_payload(decoder.as_ref(), &image)?;
            Ok::<_, TesseraError>((image, unique_id))
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Capture decoding task failed");
            TesseraError::InvalidImage(format!("Image decoding aborted: {}", e))
        })??;

        tracing::debug!(unique_id = %unique_id, "Decoded capture payload");

        let Some(record) = self.registry.find_record(&unique_id).await? else {
            tracing::info!(unique_id = %unique_id, "Unknown product code");
            let decision = self.policy.decide(Evidence::CodeAbsent);
            return Ok(VerificationReport {
                verdict: decision.verdict,
                message: decision.message,
                score: decision.score,
                diagnostic: decision.diagnostic,
                product: None,
            });
        };

        let master_png = self.registry.pattern_for(&record).await?;

        let pattern_size = self.registry.pattern_size();
        let extractor = self.extractor;
        let scorer = self.scorer;
        let scored = tokio::task::spawn_blocking(move || {
            let master = decode_png(&master_png, pattern_size)?;
            let candidate = extractor.candidate(&image, master.dimensions())?;
            scorer.score(&master, &candidate)
        })
        .await;

        let evidence = match scored {
            Ok(Ok(score)) => Evidence::Compared(score),
            Ok(Err(e)) => Evidence::ComparisonFailed(e.to_string()),
            Err(e) => {
                tracing::warn!(unique_id = %record.unique_id, error = %e, "Comparison task failed");
                Evidence::ComparisonFailed(format!("Comparison aborted: {}", e))
            }
        };

        let decision = self.policy.decide(evidence);
        tracing::info!(
            unique_id = %record.unique_id,
            verdict = %decision.verdict,
            score = ?decision.score,
            "Verification complete"
        );

        Ok(VerificationReport {
            verdict: decision.verdict,
            message: decision.message,
            score: decision.score,
            diagnostic: decision.diagnostic,
            product: Some(ProductSummary::from(&record)),
        })
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("registry", &self.registry)
            .field("extractor", &self.extractor)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::MockEntropy;
    use crate::pattern::{encode_png, PatternGenerator};
    use image::GrayImage;

    /// Reports a fixed payload for every raster.
    struct FixedDecoder(String);

    impl PayloadDecoder for FixedDecoder {
        fn decode(&self, _image: &GrayImage) -> Vec<String> {
            vec![self.0.clone()]
        }
    }

    /// Panics inside the blocking decode task.
    struct PanickingDecoder;

    impl PayloadDecoder for PanickingDecoder {
        fn decode(&self, _image: &GrayImage) -> Vec<String> {
            panic!("decoder crashed");
        }
    }

    fn verifier_reading(payload: &str) -> Verifier {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        Verifier::new(registry).with_decoder(Arc::new(FixedDecoder(payload.to_string())))
    }

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        encode_png(&GrayImage::new(width, height)).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_code_is_counterfeit() {
        let verifier = verifier_reading("never-issued");
        let report = verifier.verify(png_of(64, 64)).await.unwrap();

        assert_eq!(report.verdict, Verdict::Counterfeit);
        assert!(report.message.contains("does not exist"));
        assert!(report.product.is_none());
        assert!(report.score.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_invalid_image() {
        let verifier = verifier_reading("whatever");
        let err = verifier.verify(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, TesseraError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_crashed_decoder_is_invalid_image() {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        let verifier = Verifier::new(registry).with_decoder(Arc::new(PanickingDecoder));

        let err = verifier.verify(png_of(64, 64)).await.unwrap_err();
        match err {
            TesseraError::InvalidImage(detail) => assert!(detail.contains("aborted")),
            other => panic!("expected InvalidImage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_payload_is_invalid_image() {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        let verifier = Verifier::new(registry);

        let err = verifier.verify(png_of(64, 64)).await.unwrap_err();
        assert!(matches!(err, TesseraError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_master_itself_is_authentic() {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        let record = registry.create("Widget", "Acme").await.unwrap();
        let master_png = registry.get_master_pattern(&record.unique_id).await.unwrap();

        let verifier = Verifier::new(registry)
            .with_decoder(Arc::new(FixedDecoder(record.unique_id.clone())));
        let report = verifier.verify(master_png).await.unwrap();

        assert_eq!(report.verdict, Verdict::Authentic);
        assert_eq!(report.score, Some(1.0));
        let product = report.product.unwrap();
        assert_eq!(product.unique_id, record.unique_id);
        assert_eq!(product.product_name, "Widget");
    }

    #[tokio::test]
    async fn test_too_small_capture_is_unable_to_verify() {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        let record = registry.create("Widget", "Acme").await.unwrap();

        let verifier = Verifier::new(registry)
            .with_decoder(Arc::new(FixedDecoder(record.unique_id.clone())));
        let report = verifier.verify(png_of(20, 20)).await.unwrap();

        assert_eq!(report.verdict, Verdict::UnableToVerify);
        assert!(report.diagnostic.unwrap().contains("smaller than"));
        assert!(report.product.is_some());
    }

    #[tokio::test]
    async fn test_flat_capture_is_counterfeit() {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(MockEntropy::default())));
        let record = registry.create("Widget", "Acme").await.unwrap();

        let verifier = Verifier::new(registry)
            .with_decoder(Arc::new(FixedDecoder(record.unique_id.clone())));
        let report = verifier.verify(png_of(100, 100)).await.unwrap();

        assert_eq!(report.verdict, Verdict::Counterfeit);
        assert!(report.score.unwrap() < 0.5);
        assert!(report.product.is_some());
    }

    #[test]
    fn test_report_omits_absent_fields() {
        let report = VerificationReport {
            verdict: Verdict::Counterfeit,
            message: "absent".into(),
            score: None,
            diagnostic: None,
            product: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "COUNTERFEIT");
        assert!(json.get("score").is_none());
        assert!(json.get("product").is_none());
    }
}
