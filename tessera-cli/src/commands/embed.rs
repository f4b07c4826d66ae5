//! Embed command implementation.
//!
//! Builds an issued code locally from a pattern file, without a server. Useful
//! for print-shop proofs and for producing test captures.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tessera_core::{
    decode_png, encode_png, Embedder, ErrorCorrection, SymbolStyle, PATTERN_SIZE,
};
use tracing::debug;

use crate::utils::{read_input, write_output};

/// Layout of the rendered symbol.
pub struct EmbedOptions {
    pub module_px: u32,
    pub quiet_zone: u32,
}

/// Execute the embed command.
pub fn execute(
    pattern: PathBuf,
    unique_id: String,
    output: Option<PathBuf>,
    options: EmbedOptions,
    quiet: bool,
) -> Result<()> {
    let bytes = read_input(&pattern)?;
    let pattern_image = decode_png(&bytes, PATTERN_SIZE)
        .with_context(|| format!("Invalid pattern file: {}", pattern.display()))?;

    let embedder = Embedder::new(SymbolStyle {
        module_px: options.module_px,
        quiet_zone: options.quiet_zone,
        error_correction: ErrorCorrection::High,
    })?;

    let composite = embedder
        .issue(&unique_id, &pattern_image)
        .context("Failed to render code")?;
    debug!(side = composite.width(), "Composite rendered");

    let png = encode_png(&composite).context("Failed to encode code image")?;
    let output = output.unwrap_or_else(|| default_output(&unique_id));
    write_output(&output, &png)?;

    if !quiet {
        println!();
        println!("{}", "Pattern embedded!".green().bold());
        println!();
        println!("   {} {}", "Unique ID:".dimmed(), unique_id);
        println!(
            "   {} {}x{} px",
            "Code size:".dimmed(),
            composite.width(),
            composite.height()
        );
        println!("   {} {}", "Code saved:".dimmed(), output.display());
    }

    Ok(())
}

fn default_output(unique_id: &str) -> PathBuf {
    let short_id: String = unique_id.chars().take(8).collect();
    PathBuf::from(format!("{}_code.png", short_id))
}
