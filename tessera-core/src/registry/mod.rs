//! Registry binding each product identifier to its one immutable master pattern.
//!
//! Persistence is split in two injected stores:
//! - **[`BlobStore`]** holds the master pattern PNGs, keyed by `unique_id`
//! - **[`RecordStore`]** holds the product rows (name, company, timestamp, pattern ref)
//!
//! Both stores only ever insert-if-absent. An identifier collision surfaces as
//! `DuplicateIdentifier` and is resolved by drawing a fresh identifier, never by
//! overwriting what is already there.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::{MemoryBlobStore, MemoryRecordStore};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError, PATTERN_SIZE};
use crate::pattern::{encode_png, pattern_digest, PatternGenerator};

/// Attempts `create` makes before giving up on identifier collisions.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// A registered product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Registry-assigned sequential id
    pub id: i64,
    /// Opaque token carried as the scannable payload (UUID v4)
    pub unique_id: String,
    pub product_name: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    /// Blob store locator of the master pattern
    pub master_pattern_ref: String,
    /// SHA3-256 of the persisted pattern PNG (hex)
    pub pattern_digest: String,
}

/// Input for inserting a product row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub unique_id: String,
    pub product_name: String,
    pub company_name: String,
    pub master_pattern_ref: String,
    pub pattern_digest: String,
}

/// Storage for master pattern bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `unique_id` and return the locator to record.
    ///
    /// Fails with `DuplicateIdentifier` when something is already stored under
    /// that identifier; existing bytes are never replaced.
    async fn put_if_absent(&self, unique_id: &str, bytes: Vec<u8>) -> Result<String>;

    /// Fetch the bytes behind a locator returned by `put_if_absent`.
    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>>;

    /// Delete the bytes behind a locator. Deleting a missing entry is not an error.
    async fn remove(&self, reference: &str) -> Result<()>;
}

/// Storage for product rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row, assigning `id` and `created_at`.
    ///
    /// Fails with `DuplicateIdentifier` when `unique_id` is already registered.
    async fn insert_if_absent(&self, product: NewProduct) -> Result<ProductRecord>;

    async fn get(&self, unique_id: &str) -> Result<Option<ProductRecord>>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

type IdSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Issues products and serves their master patterns.
#[derive(Clone)]
pub struct Registry {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    generator: PatternGenerator,
    pattern_size: u32,
    max_attempts: u32,
    id_source: IdSource,
}

impl Registry {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        generator: PatternGenerator,
    ) -> Self {
        Self {
            records,
            blobs,
            generator,
            pattern_size: PATTERN_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            id_source: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Registry over in-memory stores.
    pub fn in_memory(generator: PatternGenerator) -> Self {
        Self::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
            generator,
        )
    }

    /// Replace the identifier allocator.
    pub fn with_id_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.id_source = Arc::new(source);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn pattern_size(&self) -> u32 {
        self.pattern_size
    }

    /// Register a product under a fresh identifier with a fresh master pattern.
    pub async fn create(&self, product_name: &str, company_name: &str) -> Result<ProductRecord> {
        for attempt in 1..=self.max_attempts {
            let unique_id = (self.id_source)();

            let pattern = self.generator.generate(self.pattern_size)?;
            let png = encode_png(&pattern)?;
            let digest = pattern_digest(&png);

            let master_pattern_ref = match self.blobs.put_if_absent(&unique_id, png).await {
                Ok(reference) => reference,
                Err(TesseraError::DuplicateIdentifier(_)) => {
                    tracing::warn!(
                        attempt,
                        unique_id = %unique_id,
                        "Pattern already stored, retrying"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            let new_product = NewProduct {
                unique_id: unique_id.clone(),
                product_name: product_name.to_string(),
                company_name: company_name.to_string(),
                master_pattern_ref: master_pattern_ref.clone(),
                pattern_digest: digest,
            };

            match self.records.insert_if_absent(new_product).await {
                Ok(record) => {
                    tracing::info!(
                        id = record.id,
                        unique_id = %record.unique_id,
                        attempt,
                        "Product registered"
                    );
                    return Ok(record);
                }
                Err(e) => {
                    if let Err(cleanup) = self.blobs.remove(&master_pattern_ref).await {
                        tracing::error!(
                            unique_id = %unique_id,
                            error = %cleanup,
                            "Failed to remove orphaned master pattern"
                        );
                    }
                    match e {
                        TesseraError::DuplicateIdentifier(_) => {
                            tracing::warn!(
                                attempt,
                                unique_id = %unique_id,
                                "Identifier collision, retrying"
                            );
                        }
                        other => return Err(other),
                    }
                }
            }
        }

        Err(TesseraError::Storage(format!(
            "Could not allocate a unique identifier after {} attempts",
            self.max_attempts
        )))
    }

    /// Look up a record; `None` when the identifier was never issued.
    pub async fn find_record(&self, unique_id: &str) -> Result<Option<ProductRecord>> {
        self.records.get(unique_id).await
    }

    pub async fn get_record(&self, unique_id: &str) -> Result<ProductRecord> {
        self.find_record(unique_id)
            .await?
            .ok_or_else(|| TesseraError::NotFound(format!("Product {}", unique_id)))
    }

    /// Fetch the persisted master pattern PNG for `unique_id`.
    pub async fn get_master_pattern(&self, unique_id: &str) -> Result<Vec<u8>> {
        let record = self.get_record(unique_id).await?;
        self.pattern_for(&record).await
    }

    /// Fetch and integrity-check the master pattern behind `record`.
    ///
    /// A record whose pattern is missing or altered is a persistence failure.
    pub async fn pattern_for(&self, record: &ProductRecord) -> Result<Vec<u8>> {
        let bytes = self
            .blobs
            .get(&record.master_pattern_ref)
            .await?
            .ok_or_else(|| {
                TesseraError::Storage(format!(
                    "Master pattern {} missing for product {}",
                    record.master_pattern_ref, record.unique_id
                ))
            })?;

        if pattern_digest(&bytes) != record.pattern_digest {
            tracing::error!(
                unique_id = %record.unique_id,
                reference = %record.master_pattern_ref,
                "Master pattern digest mismatch"
            );
            return Err(TesseraError::Storage(format!(
                "Master pattern for product {} failed its integrity check",
                record.unique_id
            )));
        }

        Ok(bytes)
    }

    /// Check that the record backend is reachable.
    pub async fn ready(&self) -> Result<()> {
        self.records.ping().await
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("generator", &self.generator)
            .field("pattern_size", &self.pattern_size)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
