//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Build the output file name for an issued code.
///
/// `Widget Pro` with id `0f8fad5b-...` becomes `Widget_Pro_0f8fad5b.png`.
pub fn build_code_path(dir: &Path, product_name: &str, unique_id: &str) -> PathBuf {
    let name: String = product_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let short_id: String = unique_id.chars().take(8).collect();

    dir.join(format!("{}_{}.png", name, short_id))
}

/// Read an input file, tagging failures for the input-error exit code.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Read file");
    Ok(bytes)
}

/// Write an output file, tagging failures for the I/O exit code.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

/// Format a timestamp as a human-readable UTC string.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_code_path() {
        assert_eq!(
            build_code_path(
                Path::new("out"),
                "Widget Pro",
                "0f8fad5b-d9cb-469f-a165-70867728950e"
            ),
            PathBuf::from("out/Widget_Pro_0f8fad5b.png")
        );
        assert_eq!(
            build_code_path(Path::new(""), "a/b", "1234"),
            PathBuf::from("a_b_1234.png")
        );
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
        let formatted = format_timestamp(&ts);
        assert_eq!(formatted, "2024-01-15 12:30:45 UTC");
    }

    #[test]
    fn test_read_missing_input() {
        let err = read_input(Path::new("does/not/exist.png")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read file"));
    }
}
