//! HTTP client for the Tessera server.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use serde_json::json;
use tessera_core::{ProductRecord, VerificationReport};
use tracing::{debug, instrument};

/// Default server URL when neither `--server` nor `TESSERA_API_URL` is set.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the server for every non-2xx response.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    code: String,
}

/// Thin wrapper over the Tessera REST API.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a product and return its record.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_product(
        &self,
        product_name: &str,
        company_name: &str,
    ) -> Result<ProductRecord> {
        let response = self
            .client
            .post(self.url("/products"))
            .json(&json!({
                "product_name": product_name,
                "company_name": company_name,
            }))
            .send()
            .await
            .with_context(|| format!("Cannot reach server at {}", self.base_url))?;

        let record = check(response)
            .await?
            .json::<ProductRecord>()
            .await
            .context("Failed to parse product record")?;

        debug!(unique_id = %record.unique_id, "Product registered");
        Ok(record)
    }

    /// Download the issued code (symbol with embedded pattern) as PNG bytes.
    pub async fn code_png(&self, unique_id: &str) -> Result<Vec<u8>> {
        self.get_png(&format!("/products/{}/code", unique_id)).await
    }

    /// Download the master pattern as PNG bytes.
    pub async fn pattern_png(&self, unique_id: &str) -> Result<Vec<u8>> {
        self.get_png(&format!("/products/{}/pattern", unique_id)).await
    }

    async fn get_png(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("Cannot reach server at {}", self.base_url))?;

        let bytes = check(response)
            .await?
            .bytes()
            .await
            .context("Failed to download image")?;
        Ok(bytes.to_vec())
    }

    /// Submit a captured photo for verification.
    #[instrument(level = "debug", skip(self, capture), fields(bytes = capture.len()))]
    pub async fn verify(
        &self,
        capture: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<VerificationReport> {
        let part = multipart::Part::bytes(capture)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .context("Invalid capture content type")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/verify"))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Cannot reach server at {}", self.base_url))?;

        check(response)
            .await?
            .json::<VerificationReport>()
            .await
            .context("Failed to parse verification response")
    }
}

/// Turn a non-2xx response into an error carrying the server's `code`.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(api) => bail!(
            "Server rejected request ({} {}): {}",
            status.as_u16(),
            api.code,
            api.error
        ),
        Err(_) => bail!("Server rejected request ({}): {}", status.as_u16(), body),
    }
}

/// Guess a capture's MIME type from its file extension.
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
