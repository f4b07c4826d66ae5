//! Exit codes following sysexits.h conventions.
//!
//! Verdicts get their own codes so scripts can tell a counterfeit from a
//! capture that could not be checked.

/// Successful execution (authentic, or command completed).
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// The verified product is counterfeit.
pub const COUNTERFEIT: i32 = 3;

/// The image holds no readable code.
/// Maps to EX_DATAERR from sysexits.h.
pub const INVALID_IMAGE: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Server unreachable.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// The code is known but its pattern could not be compared; retry with a better photo.
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const UNABLE_TO_VERIFY: i32 = 75;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let unreachable = err.chain().any(|cause| {
            cause
                .downcast_ref::<reqwest::Error>()
                .is_some_and(|e| e.is_connect() || e.is_timeout())
        });

        // Classify error by inspecting the chain
        let code = if unreachable {
            NETWORK_ERROR
        } else if message.contains("Failed to read file") {
            INPUT_ERROR
        } else if message.contains("COUNTERFEIT") {
            COUNTERFEIT
        } else if message.contains("UNABLE_TO_VERIFY") {
            UNABLE_TO_VERIFY
        } else if message.contains("INVALID_IMAGE") || message.contains("Invalid image") {
            INVALID_IMAGE
        } else if message.contains("Failed to write") {
            IO_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_classifies_verdicts() {
        let err = anyhow!("Verification failed: COUNTERFEIT");
        assert_eq!(ExitCode::from_anyhow(&err).code, COUNTERFEIT);

        let err = anyhow!("Verification failed: UNABLE_TO_VERIFY");
        assert_eq!(ExitCode::from_anyhow(&err).code, UNABLE_TO_VERIFY);
    }

    #[test]
    fn test_classifies_input_and_output_errors() {
        let err = Err::<(), _>(std::io::Error::other("gone"))
            .context("Failed to read file: photo.png")
            .unwrap_err();
        assert_eq!(ExitCode::from_anyhow(&err).code, INPUT_ERROR);

        let err = anyhow!("Failed to write code image");
        assert_eq!(ExitCode::from_anyhow(&err).code, IO_ERROR);
    }

    #[test]
    fn test_server_rejection_of_capture() {
        let err = anyhow!("Server rejected request (422 INVALID_IMAGE): Invalid image: no code");
        assert_eq!(ExitCode::from_anyhow(&err).code, INVALID_IMAGE);
    }

    #[test]
    fn test_unknown_errors_are_general() {
        let err = anyhow!("something odd");
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, GENERAL_ERROR);
        assert_eq!(exit.message.as_deref(), Some("something odd"));
    }
}
