//! Multipart form parsing helpers
//!
//! Extracts the uploaded capture from a multipart/form-data request.

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File field (named "file")
    file: Option<FileField>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// Only the `file` field is read; other fields are skipped. The file's
    /// Content-Type and size are validated as it is read.
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut file: Option<FileField> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name != "file" {
                tracing::debug!(field = %name, "Skipping unknown multipart field");
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let file_name = field.file_name().map(|s| s.to_string());
            validate_content_type(content_type.as_deref())?;

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                .to_vec();
            validate_file_size(data.len(), max_file_size)?;

            file = Some(FileField {
                data,
                content_type,
                file_name,
            });
        }

        Ok(Self { file })
    }

    /// Take the file field (required)
    ///
    /// Returns an error if no file was uploaded.
    pub fn require_file(self) -> Result<FileField, ApiError> {
        self.file.ok_or_else(|| {
            ApiError::bad_request("No file provided. Use 'file' field in multipart form.")
        })
    }
}
