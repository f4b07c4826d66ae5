//! Tessera CLI - register, issue and verify copy-detection-pattern codes.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod client;
mod commands;
mod exit_codes;
mod utils;

use client::{ApiClient, DEFAULT_SERVER_URL};
use commands::embed::EmbedOptions;
use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success (product authentic)
  1   General error
  3   Product counterfeit
  65  No readable code in the image
  66  Cannot read input file
  69  Server unreachable
  74  Cannot write output file
  75  Unable to verify (retake the photo)";

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Copy-detection-pattern product authentication", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Tessera server URL
    #[arg(long, global = true, env = "TESSERA_API_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a product and download its printable code
    Create {
        /// Product name
        #[arg(long)]
        name: String,

        /// Company name
        #[arg(long)]
        company: String,

        /// Directory the code image is written to
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Verify a photo of a product code
    Verify {
        /// Path to the photo (PNG, JPEG, GIF or WebP)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Print the raw verification report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a product's master pattern
    Pattern {
        /// Identifier printed in the product's code
        #[arg(value_name = "UNIQUE_ID")]
        unique_id: String,

        /// Output file (defaults to <UNIQUE_ID>_pattern.png)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Embed a pattern into a code for an identifier, offline
    Embed {
        /// Master pattern PNG (48x48 grayscale)
        #[arg(long, value_name = "FILE")]
        pattern: PathBuf,

        /// Identifier to encode
        #[arg(long, value_name = "UNIQUE_ID")]
        id: String,

        /// Output file (defaults to <ID[..8]>_code.png)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Side length of one symbol module, in pixels
        #[arg(long, default_value_t = 10)]
        module_px: u32,

        /// Width of the light border, in modules
        #[arg(long, default_value_t = 4)]
        quiet_zone: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let exit = ExitCode::from_anyhow(&err);
            if let Some(message) = &exit.message {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            exit.code
        }
    };

    std::process::exit(code);
}

#[tokio::main]
async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Create {
            name,
            company,
            output_dir,
        } => {
            let client = ApiClient::new(&cli.server)?;
            commands::create::execute(&client, name, company, output_dir, quiet).await
        }
        Commands::Verify { image, json } => {
            let client = ApiClient::new(&cli.server)?;
            commands::verify::execute(&client, image, json, quiet).await
        }
        Commands::Pattern { unique_id, output } => {
            let client = ApiClient::new(&cli.server)?;
            commands::pattern::execute(&client, unique_id, output, quiet).await
        }
        Commands::Embed {
            pattern,
            id,
            output,
            module_px,
            quiet_zone,
        } => commands::embed::execute(
            pattern,
            id,
            output,
            EmbedOptions {
                module_px,
                quiet_zone,
            },
            quiet,
        ),
    }
}
