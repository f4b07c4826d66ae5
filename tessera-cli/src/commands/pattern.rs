//! Pattern command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::utils::write_output;

/// Execute the pattern command: download a product's master pattern.
pub async fn execute(
    client: &ApiClient,
    unique_id: String,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let png = client.pattern_png(&unique_id).await?;

    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}_pattern.png", unique_id)));
    write_output(&output, &png)?;

    if !quiet {
        println!("{} {}", "Master pattern saved:".green(), output.display());
    }

    Ok(())
}
