//! Mock entropy implementation for testing.

use std::sync::atomic::{AtomicU64, Ordering};

use sha3::{Digest, Sha3_256};

use super::{EntropyKind, EntropySource};
use crate::error::Result;

/// Mock entropy source for testing.
/// WARNING: Do not use for issuance - output is fully determined by the seed!
///
/// Bytes are produced by hashing `(seed, call, block)` with SHA3-256, so two mocks
/// with the same seed replay the same sequence while successive calls on one mock
/// still yield different patterns.
pub struct MockEntropy {
    seed: u64,
    calls: AtomicU64,
}

impl MockEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            calls: AtomicU64::new(0),
        }
    }

    /// Create a mock with default seed for simple tests.
    pub fn default_test() -> Self {
        Self::new(0xDEADBEEF_CAFEBABE)
    }
}

impl Default for MockEntropy {
    fn default() -> Self {
        Self::default_test()
    }
}

impl EntropySource for MockEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);

        for (block, chunk) in dest.chunks_mut(32).enumerate() {
            let mut hasher = Sha3_256::new();
            hasher.update(self.seed.to_le_bytes());
            hasher.update(call.to_le_bytes());
            hasher.update((block as u64).to_le_bytes());
            hasher.update(b"tessera-mock-entropy");
            let digest = hasher.finalize();
            chunk.copy_from_slice(&digest[..chunk.len()]);
        }
        Ok(())
    }

    fn source_id(&self) -> EntropyKind {
        EntropyKind::Mock
    }
}
