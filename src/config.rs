//! Configuration Module
//!
//! Handles loading jar and store settings from environment variables.

use std::env;
use std::path::PathBuf;

/// Default per-cookie size budget in bytes (name + value), the common
/// browser limit.
pub const DEFAULT_BUDGET_BYTES: usize = 4096;

/// Jar and store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum bytes a single cookie (name + value) may occupy in the store
    pub budget_bytes: usize,
    /// Domain applied to jars opened without an explicit one
    pub domain: Option<String>,
    /// Backing file used by the file store
    pub cookie_file: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COOKIE_BUDGET_BYTES` - Per-cookie size budget (default: 4096)
    /// - `COOKIE_DOMAIN` - Default cookie domain (default: none)
    /// - `COOKIE_FILE` - File store path (default: cookies.json)
    pub fn from_env() -> Self {
        Self {
            budget_bytes: env::var("COOKIE_BUDGET_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BUDGET_BYTES),
            domain: env::var("COOKIE_DOMAIN").ok().filter(|v| !v.is_empty()),
            cookie_file: env::var("COOKIE_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cookies.json")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_BUDGET_BYTES,
            domain: None,
            cookie_file: PathBuf::from("cookies.json"),
        }
    }
}
