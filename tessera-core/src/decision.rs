//! Mapping lookup and scoring outcomes to a verdict.
//!
//! | Evidence                         | Verdict            |
//! |----------------------------------|--------------------|
//! | identifier absent from registry  | `Counterfeit`      |
//! | comparison raised an error       | `UnableToVerify`   |
//! | score ≥ threshold                | `Authentic`        |
//! | score < threshold                | `Counterfeit`      |
//!
//! Deciding is a pure function: no retries, no hidden state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError, DEFAULT_THRESHOLD};

/// Closed set of verification outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Authentic,
    Counterfeit,
    UnableToVerify,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Authentic => write!(f, "AUTHENTIC"),
            Verdict::Counterfeit => write!(f, "COUNTERFEIT"),
            Verdict::UnableToVerify => write!(f, "UNABLE_TO_VERIFY"),
        }
    }
}

/// What the verification pipeline learned before deciding.
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    /// The decoded identifier has no registry record
    CodeAbsent,
    /// The identifier is registered and the candidate scored this value
    Compared(f64),
    /// The identifier is registered but extraction or scoring failed
    ComparisonFailed(String),
}

/// A verdict with its supporting score and diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Acceptance threshold for similarity scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(TesseraError::InvalidConfig(format!(
                "threshold must be a number in [-1, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, evidence: Evidence) -> Decision {
        match evidence {
            Evidence::CodeAbsent => Decision {
                verdict: Verdict::Counterfeit,
                message: "This product code does not exist in our system. \
                          This is a suspected counterfeit."
                    .into(),
                score: None,
                diagnostic: None,
            },
            Evidence::ComparisonFailed(diagnostic) => Decision {
                verdict: Verdict::UnableToVerify,
                message: "The product code was recognized but its pattern could not be \
                          compared. Please try again with a clearer photo."
                    .into(),
                score: None,
                diagnostic: Some(diagnostic),
            },
            Evidence::Compared(score) if score >= self.threshold => Decision {
                verdict: Verdict::Authentic,
                message: "This product is authentic.".into(),
                score: Some(score),
                diagnostic: None,
            },
            Evidence::Compared(score) => Decision {
                verdict: Verdict::Counterfeit,
                message: format!(
                    "The pattern does not match the original (similarity {:.2}, required {:.2}). \
                     This is a suspected counterfeit.",
                    score, self.threshold
                ),
                score: Some(score),
                diagnostic: None,
            },
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}
