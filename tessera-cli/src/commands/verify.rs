//! Verify command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::{ColoredString, Colorize};
use tessera_core::{VerificationReport, Verdict};
use tracing::{info, warn};

use crate::client::{mime_for, ApiClient};
use crate::utils::{format_timestamp, read_input};

/// Execute the verify command.
pub async fn execute(client: &ApiClient, image: PathBuf, json: bool, quiet: bool) -> Result<()> {
    let capture = read_input(&image)?;

    let file_name = image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("capture")
        .to_string();
    let report = client
        .verify(capture, &file_name, mime_for(&file_name))
        .await
        .context("Verification request failed")?;

    info!(
        verdict = %report.verdict,
        score = ?report.score,
        "Verification completed"
    );

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", rendered);
    } else if !quiet {
        print_report(&report);
    }

    match report.verdict {
        Verdict::Authentic => Ok(()),
        Verdict::Counterfeit => bail!("Verification failed: {}", report.verdict),
        Verdict::UnableToVerify => {
            warn!(diagnostic = ?report.diagnostic, "Pattern could not be compared");
            bail!("Verification failed: {}", report.verdict)
        }
    }
}

fn print_report(report: &VerificationReport) {
    let paint = |s: &str| -> ColoredString {
        match report.verdict {
            Verdict::Authentic => s.green(),
            Verdict::Counterfeit => s.red(),
            Verdict::UnableToVerify => s.yellow(),
        }
    };

    println!();
    println!("{}", paint("╔════════════════════════════════════════╗"));
    println!(
        "{}",
        paint(&format!("║{:^40}║", report.verdict.to_string())).bold()
    );
    println!("{}", paint("╚════════════════════════════════════════╝"));
    println!();
    println!("   {} {}", "Result:".dimmed(), report.message);

    if let Some(score) = report.score {
        println!("   {} {:.4}", "Similarity:".dimmed(), score);
    }
    if let Some(diagnostic) = &report.diagnostic {
        println!("   {} {}", "Diagnostic:".dimmed(), diagnostic.yellow());
    }
    if let Some(product) = &report.product {
        println!("   {} {}", "Product:".dimmed(), product.product_name);
        println!("   {} {}", "Company:".dimmed(), product.company_name);
        println!("   {} {}", "Unique ID:".dimmed(), product.unique_id);
        println!(
            "   {} {}",
            "Registered:".dimmed(),
            format_timestamp(&product.created_at)
        );
    }
}
