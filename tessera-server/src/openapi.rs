//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the Tessera API.

use utoipa::OpenApi;

use crate::handlers::{
    CreateProductRequest, HealthResponse, ProductResponse, ReadyResponse, VerifiedProduct,
    VerifyResponse,
};

/// Tessera API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tessera - Product Authentication API",
        version = "0.1.0",
        description = r#"
## Copy-Detection-Pattern Authentication API

Tessera authenticates physical goods with **copy-detection patterns**: a random
48×48 grayscale texture embedded in the center of each product's scannable code.

### How It Works

1. **Register** a product via `POST /products`; it receives a unique identifier
   and its own master pattern, fixed forever
2. **Print** the issued code from `GET /products/{unique_id}/code`
3. **Verify** a photo of the code via `POST /verify`
4. The embedded texture is compared with the registered master; copies of a
   printed code lose its fine structure and fail the comparison

### Verdicts

- `AUTHENTIC` - the pattern matches the registered master
- `COUNTERFEIT` - the code is unknown, or its pattern does not match
- `UNABLE_TO_VERIFY` - the code is known but the pattern could not be compared
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Products", description = "Register products and download their patterns and codes"),
        (name = "Verification", description = "Verify photographed product codes"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::get_pattern,
        crate::handlers::products::get_code,
        crate::handlers::verify::verify_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            CreateProductRequest,
            ProductResponse,
            VerifyResponse,
            VerifiedProduct,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_all_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/ready",
            "/products",
            "/products/{unique_id}",
            "/products/{unique_id}/pattern",
            "/products/{unique_id}/code",
            "/verify",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
