//! Randomness sources for master pattern generation.
//!
//! Every master pattern must be drawn from a high-quality, non-replayable source:
//! a predictable pattern can be regenerated by a counterfeiter without ever seeing
//! a genuine unit.
//!
//! - **OS** - the operating system CSPRNG (production)
//! - **Mock** - deterministic SHA3 stream for tests (NOT suitable for issuance)

mod mock;
mod os;

pub use mock::MockEntropy;
pub use os::OsEntropy;

use crate::error::Result;

/// Trait for sources of pattern entropy.
///
/// Implementations must be thread-safe (`Send + Sync`) since a single source is
/// shared by every concurrent issuance request.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;

    /// Identifies the kind of source, for logging.
    fn source_id(&self) -> EntropyKind;
}

/// Identifies an entropy source for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntropyKind {
    /// Operating system CSPRNG
    Os,
    /// Deterministic mock source (NOT safe for issuance!)
    Mock,
}

impl std::fmt::Display for EntropyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Os => write!(f, "OS CSPRNG"),
            Self::Mock => write!(f, "Mock (NOT ISSUANCE-SAFE)"),
        }
    }
}
