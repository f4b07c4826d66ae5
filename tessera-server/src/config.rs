//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use tessera_core::{ErrorCorrection, SymbolStyle, DEFAULT_THRESHOLD};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 20)
    pub body_limit_mb: usize,
    /// Maximum capture size per upload in MB (default: 10)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// PostgreSQL connection string for product rows (in-memory when unset)
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 20)
    pub database_max_connections: u32,
    /// Database connection pool minimum connections (default: 2)
    pub database_min_connections: u32,
    /// Directory holding master pattern PNGs (in-memory when unset)
    pub pattern_dir: Option<PathBuf>,
    /// Similarity score at or above which a capture is authentic (default: 0.90)
    pub auth_threshold: f64,
    /// Ratio of capture pixels to issuance pixels (default: 1.0)
    pub capture_scale: f64,
    /// Pixels per symbol module in issued codes (default: 10)
    pub module_px: u32,
    /// Quiet zone around issued codes, in modules (default: 4)
    pub quiet_zone_modules: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 20,
            max_file_size_mb: 10,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            database_max_connections: 20,
            database_min_connections: 2,
            pattern_dir: None,
            auth_threshold: DEFAULT_THRESHOLD,
            capture_scale: 1.0,
            module_px: 10,
            quiet_zone_modules: 4,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable value");
            default
        }),
        Err(_) => default,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            port: env_or("PORT", defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_or("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_or("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            database_url: non_empty_env("DATABASE_URL"),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_min_connections: env_or(
                "DATABASE_MIN_CONNECTIONS",
                defaults.database_min_connections,
            ),
            pattern_dir: non_empty_env("PATTERN_DIR").map(PathBuf::from),
            auth_threshold: env_or("AUTH_THRESHOLD", defaults.auth_threshold),
            capture_scale: env_or("CAPTURE_SCALE", defaults.capture_scale),
            module_px: env_or("MODULE_PX", defaults.module_px),
            quiet_zone_modules: env_or("QUIET_ZONE_MODULES", defaults.quiet_zone_modules),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum capture size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Layout of issued codes. Always High error correction.
    pub fn symbol_style(&self) -> SymbolStyle {
        SymbolStyle {
            module_px: self.module_px,
            quiet_zone: self.quiet_zone_modules,
            error_correction: ErrorCorrection::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert!(config.pattern_dir.is_none());
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.auth_threshold, 0.90);
        assert_eq!(config.capture_scale, 1.0);
    }

    #[test]
    fn test_symbol_style_from_config() {
        let config = Config {
            module_px: 6,
            quiet_zone_modules: 2,
            ..Config::default()
        };
        let style = config.symbol_style();
        assert_eq!(style.module_px, 6);
        assert_eq!(style.quiet_zone, 2);
        assert_eq!(style.error_correction, ErrorCorrection::High);
    }

    #[test]
    fn test_socket_addr_and_file_size() {
        let config = Config::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.max_file_size(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("TESSERA_TEST_SURELY_UNSET_VARIABLE", 42u32), 42);
    }
}
