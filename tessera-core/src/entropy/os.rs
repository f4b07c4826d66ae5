//! Operating system entropy.

use rand::rngs::OsRng;
use rand::TryRngCore;

use super::{EntropyKind, EntropySource};
use crate::error::{Result, TesseraError};

/// Entropy read directly from the operating system CSPRNG.
///
/// Each call reads fresh bytes from the kernel; nothing is seeded or cached in
/// process, so no two invocations can replay each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl OsEntropy {
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| TesseraError::Entropy(format!("OS random source failed: {}", e)))
    }

    fn source_id(&self) -> EntropyKind {
        EntropyKind::Os
    }
}
