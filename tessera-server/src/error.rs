//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tessera_core::TesseraError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Tessera core error - error from the authentication engine
    #[error("Tessera error: {0}")]
    Tessera(#[from] TesseraError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Tessera(ref e) => match e {
                TesseraError::NotFound(_) => StatusCode::NOT_FOUND,

                // Captures that cannot be read → 422 Unprocessable Entity
                TesseraError::InvalidImage(_) | TesseraError::ComparisonError(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }

                TesseraError::DuplicateIdentifier(_) => StatusCode::CONFLICT,

                // Randomness is an OS service; failing it is transient
                TesseraError::Entropy(_) => StatusCode::SERVICE_UNAVAILABLE,

                TesseraError::Storage(_)
                | TesseraError::Codec(_)
                | TesseraError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Tessera(ref e) => match e {
                TesseraError::NotFound(_) => "NOT_FOUND",
                TesseraError::InvalidImage(_) => "INVALID_IMAGE",
                TesseraError::ComparisonError(_) => "COMPARISON_ERROR",
                TesseraError::DuplicateIdentifier(_) => "DUPLICATE_IDENTIFIER",
                TesseraError::Storage(_) => "STORAGE_ERROR",
                TesseraError::Entropy(_) => "ENTROPY_UNAVAILABLE",
                TesseraError::Codec(_) => "CODEC_ERROR",
                TesseraError::InvalidConfig(_) => "CONFIG_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Capture problems are the client's to fix, so their details are shown
            Self::Tessera(ref e) => match e {
                TesseraError::NotFound(what) => format!("{} not found", what),
                TesseraError::InvalidImage(detail) => format!("Invalid image: {}", detail),
                TesseraError::ComparisonError(detail) => {
                    format!("Pattern comparison failed: {}", detail)
                }
                TesseraError::DuplicateIdentifier(_) => "Identifier already registered".to_string(),
                TesseraError::Storage(_) => "Storage backend error".to_string(),
                TesseraError::Entropy(_) => "Randomness source unavailable".to_string(),
                TesseraError::Codec(_) => "Code rendering failed".to_string(),
                TesseraError::InvalidConfig(_) => "Server misconfiguration".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
            Self::Tessera(_) => "tessera",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_image_maps_to_422() {
        let err = ApiError::from(TesseraError::InvalidImage("no code".into()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "INVALID_IMAGE");
    }

    #[test]
    fn test_core_not_found_maps_to_404() {
        let err = ApiError::from(TesseraError::NotFound("Product x".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Product x not found");
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = ApiError::from(TesseraError::Storage("password=hunter2".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.client_message().contains("hunter2"));
    }

    #[test]
    fn test_request_errors_map_to_status() {
        let err = ApiError::bad_request("Uploaded file is empty");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(err.client_message(), "Bad request: Uploaded file is empty");

        let err = ApiError::internal("join error: task panicked");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_entropy_failure_is_unavailable() {
        let err = ApiError::from(TesseraError::Entropy("getrandom".into()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
