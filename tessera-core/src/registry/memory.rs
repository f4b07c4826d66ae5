//! In-memory stores for development and tests.
//!
//! Contents are lost when the process exits.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{BlobStore, NewProduct, ProductRecord, RecordStore};
use crate::error::{Result, TesseraError};

/// Master patterns held in a concurrent map. The locator is the `unique_id` itself.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_if_absent(&self, unique_id: &str, bytes: Vec<u8>) -> Result<String> {
        match self.blobs.entry(unique_id.to_string()) {
            Entry::Occupied(_) => Err(TesseraError::DuplicateIdentifier(unique_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(bytes);
                Ok(unique_id.to_string())
            }
        }
    }

    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(reference).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        self.blobs.remove(reference);
        Ok(())
    }
}

/// Product rows held in a concurrent map with sequential ids.
pub struct MemoryRecordStore {
    records: DashMap<String, ProductRecord>,
    next_id: AtomicI64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_if_absent(&self, product: NewProduct) -> Result<ProductRecord> {
        match self.records.entry(product.unique_id.clone()) {
            Entry::Occupied(_) => Err(TesseraError::DuplicateIdentifier(product.unique_id)),
            Entry::Vacant(slot) => {
                let record = ProductRecord {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    unique_id: product.unique_id,
                    product_name: product.product_name,
                    company_name: product.company_name,
                    created_at: Utc::now(),
                    master_pattern_ref: product.master_pattern_ref,
                    pattern_digest: product.pattern_digest,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, unique_id: &str) -> Result<Option<ProductRecord>> {
        Ok(self.records.get(unique_id).map(|entry| entry.value().clone()))
    }
}
