//! Create command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::client::ApiClient;
use crate::utils::{build_code_path, format_timestamp, write_output};

/// Execute the create command.
///
/// Registers the product, then downloads its issued code into `output_dir`.
pub async fn execute(
    client: &ApiClient,
    product_name: String,
    company_name: String,
    output_dir: PathBuf,
    quiet: bool,
) -> Result<()> {
    let record = client.create_product(&product_name, &company_name).await?;
    info!(unique_id = %record.unique_id, id = record.id, "Product registered");

    let code = client.code_png(&record.unique_id).await?;
    let code_path = build_code_path(&output_dir, &record.product_name, &record.unique_id);
    write_output(&code_path, &code)?;

    if !quiet {
        println!();
        println!("{}", "Product registered!".green().bold());
        println!();
        println!("   {} {}", "Unique ID:".dimmed(), record.unique_id);
        println!("   {} {}", "Product:".dimmed(), record.product_name);
        println!("   {} {}", "Company:".dimmed(), record.company_name);
        println!(
            "   {} {}",
            "Created at:".dimmed(),
            format_timestamp(&record.created_at)
        );
        println!("   {} {}", "Code saved:".dimmed(), code_path.display());
    }

    Ok(())
}
