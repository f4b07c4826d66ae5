//! Application state module
//!
//! Defines shared state accessible across all request handlers, and the selection
//! of storage backends from configuration.

use std::sync::Arc;

use tessera_core::{
    BlobStore, DecisionPolicy, Embedder, Extractor, FsBlobStore, MemoryBlobStore,
    MemoryRecordStore, OsEntropy, PatternGenerator, RecordStore, Registry, Verifier,
};

use crate::config::Config;
use crate::db::PostgresProductStore;
use crate::validation::DEFAULT_MAX_FILE_SIZE;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Product registry (records + master patterns)
    pub registry: Registry,
    /// Verification pipeline over the same registry
    pub verifier: Verifier,
    /// Renders distributable codes
    pub embedder: Embedder,
    /// Maximum accepted capture size in bytes
    pub max_file_size: usize,
    /// Human-readable description of the storage backends, for health output
    pub storage: &'static str,
}

impl AppState {
    /// In-memory state with default engine settings (for tests and local development)
    pub fn ephemeral() -> Self {
        let registry = Registry::in_memory(PatternGenerator::new(Arc::new(OsEntropy::new())));
        Self {
            verifier: Verifier::new(registry.clone()),
            registry,
            embedder: Embedder::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            storage: "memory",
        }
    }

    /// Build state from configuration, connecting to the configured backends.
    ///
    /// Falls back to in-memory storage (with a warning) for any backend that is
    /// not configured.
    pub async fn from_config(config: &Config) -> tessera_core::Result<Self> {
        let records: Arc<dyn RecordStore> = match &config.database_url {
            Some(url) => Arc::new(
                PostgresProductStore::connect(
                    url,
                    config.database_max_connections,
                    config.database_min_connections,
                )
                .await?,
            ),
            None => {
                tracing::warn!(
                    "DATABASE_URL not set - using in-memory product storage, products will be lost on restart!"
                );
                Arc::new(MemoryRecordStore::new())
            }
        };

        let blobs: Arc<dyn BlobStore> = match &config.pattern_dir {
            Some(dir) => Arc::new(FsBlobStore::open(dir).await?),
            None => {
                tracing::warn!(
                    "PATTERN_DIR not set - using in-memory pattern storage, patterns will be lost on restart!"
                );
                Arc::new(MemoryBlobStore::new())
            }
        };

        let storage = match (config.database_url.is_some(), config.pattern_dir.is_some()) {
            (true, true) => "postgres+filesystem",
            (true, false) => "postgres+memory",
            (false, true) => "memory+filesystem",
            (false, false) => "memory",
        };

        Self::assemble(records, blobs, config, storage)
    }

    /// Wire the engine components over the given stores.
    pub fn assemble(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        config: &Config,
        storage: &'static str,
    ) -> tessera_core::Result<Self> {
        let registry = Registry::new(
            records,
            blobs,
            PatternGenerator::new(Arc::new(OsEntropy::new())),
        );

        let verifier = Verifier::new(registry.clone())
            .with_extractor(Extractor::new(config.capture_scale)?)
            .with_policy(DecisionPolicy::new(config.auth_threshold)?);

        let embedder = Embedder::new(config.symbol_style())?;

        tracing::info!(
            storage,
            threshold = config.auth_threshold,
            capture_scale = config.capture_scale,
            module_px = config.module_px,
            "Authentication engine configured"
        );

        Ok(Self {
            registry,
            verifier,
            embedder,
            max_file_size: config.max_file_size(),
            storage,
        })
    }
}
