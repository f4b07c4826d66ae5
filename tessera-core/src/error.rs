use thiserror::Error;

/// Side length, in pixels, of every master pattern.
pub const PATTERN_SIZE: u32 = 48;

/// Default similarity score at or above which a capture is accepted as authentic.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Comparison error: {0}")]
    ComparisonError(String),

    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Entropy error: {0}")]
    Entropy(String),

    #[error("Symbol codec error: {0}")]
    Codec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for TesseraError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TesseraError>;
