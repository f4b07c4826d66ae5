//! Capture verification handler
//!
//! Handles POST /verify requests: decode the code in a photographed product,
//! compare its embedded pattern with the registered master, return a verdict.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{ProductSummary, VerificationReport, Verdict};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Product identified by a verified code
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifiedProduct {
    #[schema(example = "0f8fad5b-d9cb-469f-a165-70867728950e")]
    pub unique_id: String,
    #[schema(example = "Chronograph No. 7")]
    pub product_name: String,
    #[schema(example = "Maison Horlogère")]
    pub company_name: String,
    #[schema(value_type = String, example = "2026-01-08T10:00:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<ProductSummary> for VerifiedProduct {
    fn from(summary: ProductSummary) -> Self {
        Self {
            unique_id: summary.unique_id,
            product_name: summary.product_name,
            company_name: summary.company_name,
            created_at: summary.created_at,
        }
    }
}

/// Response for verification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// AUTHENTIC, COUNTERFEIT or UNABLE_TO_VERIFY
    #[schema(value_type = String, example = "AUTHENTIC")]
    pub verdict: Verdict,
    /// Human-readable explanation of the verdict
    #[schema(example = "This product is authentic.")]
    pub message: String,
    /// Structural similarity between the captured and registered patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.97)]
    pub score: Option<f64>,
    /// Why the comparison could not be completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// The registered product, when the code is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<VerifiedProduct>,
}

impl From<VerificationReport> for VerifyResponse {
    fn from(report: VerificationReport) -> Self {
        Self {
            verdict: report.verdict,
            message: report.message,
            score: report.score,
            diagnostic: report.diagnostic,
            product: report.product.map(Into::into),
        }
    }
}

/// Verify a product photo
///
/// Accepts multipart/form-data with:
/// - **file** (required): photo of the product's code (PNG, JPEG, GIF or WebP)
///
/// An unknown code is reported as COUNTERFEIT. A known code whose pattern cannot
/// be compared is reported as UNABLE_TO_VERIFY. A photo without a readable code
/// is rejected with 422 and no verdict.
#[utoipa::path(
    post,
    path = "/verify",
    tag = "Verification",
    request_body(
        content_type = "multipart/form-data",
        description = "Photo of the product code in the 'file' field"
    ),
    responses(
        (status = 200, description = "Verification completed", body = VerifyResponse),
        (status = 400, description = "Invalid request (missing file, unsupported type, too large)"),
        (status = 422, description = "No readable code in the image"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerifyResponse>, ApiError> {
    let file = MultipartFields::parse(&mut multipart, state.max_file_size)
        .await?
        .require_file()?;

    tracing::debug!(
        size = file.data.len(),
        file_name = ?file.file_name,
        content_type = ?file.content_type,
        "Verifying capture"
    );

    let report = state.verifier.verify(file.data).await?;
    Ok(Json(report.into()))
}
