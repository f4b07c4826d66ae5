//! Product issuance handlers
//!
//! Handles product registration and retrieval of master patterns and issued codes.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{decode_png, encode_png, ProductRecord};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_name;

/// Request body for product registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Product name
    #[schema(example = "Chronograph No. 7")]
    pub product_name: String,
    /// Issuing company
    #[schema(example = "Maison Horlogère")]
    pub company_name: String,
}

/// A registered product
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    /// Registry-assigned sequential id
    #[schema(example = 1)]
    pub id: i64,
    /// Identifier carried by the product's code
    #[schema(example = "0f8fad5b-d9cb-469f-a165-70867728950e")]
    pub unique_id: String,
    #[schema(example = "Chronograph No. 7")]
    pub product_name: String,
    #[schema(example = "Maison Horlogère")]
    pub company_name: String,
    /// Registration timestamp
    #[schema(value_type = String, example = "2026-01-08T10:00:00Z")]
    pub created_at: DateTime<Utc>,
    /// Locator of the stored master pattern
    #[schema(example = "0f8fad5b-d9cb-469f-a165-70867728950e.png")]
    pub master_pattern_ref: String,
    /// SHA3-256 of the master pattern PNG (hex-encoded)
    pub pattern_digest: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            unique_id: record.unique_id,
            product_name: record.product_name,
            company_name: record.company_name,
            created_at: record.created_at,
            master_pattern_ref: record.master_pattern_ref,
            pattern_digest: record.pattern_digest,
        }
    }
}

fn png_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    )
        .into_response()
}

/// Register a product
///
/// Allocates a fresh identifier and a fresh master pattern, and binds them
/// permanently to the given product and company names.
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product registered", body = ProductResponse),
        (status = 400, description = "Invalid product fields"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product_name = validate_name("product_name", &request.product_name)?;
    let company_name = validate_name("company_name", &request.company_name)?;

    let record = state.registry.create(&product_name, &company_name).await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/products/{unique_id}",
    tag = "Products",
    params(("unique_id" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Unknown identifier")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let record = state.registry.get_record(&unique_id).await?;
    Ok(Json(record.into()))
}

/// Download a master pattern
///
/// Returns the 48×48 single-channel PNG registered for the product.
#[utoipa::path(
    get,
    path = "/products/{unique_id}/pattern",
    tag = "Products",
    params(("unique_id" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Master pattern", content_type = "image/png"),
        (status = 404, description = "Unknown identifier")
    )
)]
pub async fn get_pattern(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> Result<Response, ApiError> {
    let png = state.registry.get_master_pattern(&unique_id).await?;
    Ok(png_response(png))
}

/// Download an issued code
///
/// Renders the product's scannable code with its master pattern embedded in
/// the center, ready to print.
#[utoipa::path(
    get,
    path = "/products/{unique_id}/code",
    tag = "Products",
    params(("unique_id" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Issued code", content_type = "image/png"),
        (status = 404, description = "Unknown identifier")
    )
)]
pub async fn get_code(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> Result<Response, ApiError> {
    let pattern_png = state.registry.get_master_pattern(&unique_id).await?;
    let pattern_size = state.registry.pattern_size();
    let embedder = state.embedder;

    let composite = tokio::task::spawn_blocking(move || {
        // A stored pattern that no longer decodes is a storage fault, not a client error
        let pattern = decode_png(&pattern_png, pattern_size)
            .map_err(|e| ApiError::internal(format!("Stored pattern unreadable: {}", e)))?;
        let composite = embedder.issue(&unique_id, &pattern)?;
        Ok::<_, ApiError>(encode_png(&composite)?)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Code rendering task failed: {}", e)))??;

    Ok(png_response(composite))
}
