//! Tessera Core - Copy-detection-pattern authentication engine
//!
//! This crate issues and verifies copy-detection patterns (CDPs): high-entropy
//! grayscale textures embedded in the center of a scannable code. Printing and
//! photographing a genuine unit preserves the texture's fine structure well enough to
//! match its registered master; a copy of a copy does not.
//!
//! # Components
//!
//! - [`PatternGenerator`] draws a fresh 48×48 master pattern per product
//! - [`Registry`] binds each `unique_id` to its one immutable master pattern
//! - [`Embedder`] composites a pattern into the center of a high-correction symbol
//! - [`Extractor`] crops and normalizes the candidate region of a capture
//! - [`SimilarityScorer`] computes windowed SSIM between master and candidate
//! - [`DecisionPolicy`] maps lookup and score to a [`Verdict`]
//! - [`Verifier`] runs the whole verification flow
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_core::{
//!     decode_png, encode_png, Embedder, OsEntropy, PatternGenerator, Registry, Verdict,
//!     Verifier,
//! };
//!
//! # async fn example() -> tessera_core::Result<()> {
//! let registry = Registry::in_memory(PatternGenerator::new(Arc::new(OsEntropy::new())));
//!
//! // Issue a product and render its distributable code
//! let record = registry.create("Widget", "Acme").await?;
//! let master = decode_png(&registry.get_master_pattern(&record.unique_id).await?, 48)?;
//! let composite = Embedder::default().issue(&record.unique_id, &master)?;
//!
//! // Verify a capture of that code
//! let report = Verifier::new(registry).verify(encode_png(&composite)?).await?;
//! assert_eq!(report.verdict, Verdict::Authentic);
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod embed;
pub mod entropy;
pub mod error;
pub mod extract;
pub mod pattern;
pub mod registry;
pub mod similarity;
pub mod symbol;
pub mod verify;

// Re-export main types for convenience
pub use decision::{Decision, DecisionPolicy, Evidence, Verdict};
pub use embed::{centered_offset, embed, Embedder};
pub use entropy::{EntropyKind, EntropySource, MockEntropy, OsEntropy};
pub use error::{Result, TesseraError, DEFAULT_THRESHOLD, PATTERN_SIZE};
pub use extract::{extract, normalize, Extractor, NORMALIZATION_FILTER};
pub use pattern::{decode_png, encode_png, pattern_digest, PatternGenerator};
pub use registry::{
    BlobStore, FsBlobStore, MemoryBlobStore, MemoryRecordStore, NewProduct, ProductRecord,
    RecordStore, Registry,
};
pub use similarity::{ssim, SimilarityScorer};
pub use symbol::{
    load_capture, read_payload, render_symbol, ErrorCorrection, PayloadDecoder, RqrrDecoder,
    SymbolStyle,
};
pub use verify::{ProductSummary, VerificationReport, Verifier};
