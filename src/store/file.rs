//! File-backed cookie store.
//!
//! Keeps every cookie in one JSON document, rewritten on each write:
//! `{ "<name>": { "value": "...", "domain": "..." } }`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::store::{fit_to_budget, CookieStore};

// == Cookie Record ==
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieRecord {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
}

// == File Store ==
/// JSON file store with browser-like truncation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cookies: BTreeMap<String, CookieRecord>,
    budget_bytes: usize,
}

impl FileStore {
    // == Open ==
    /// Opens the store at `path`, loading existing cookies if the file exists.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or is not valid JSON.
    pub fn open(path: impl AsRef<Path>, budget_bytes: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cookies: BTreeMap<String, CookieRecord> = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        debug!("opened cookie file {} ({} cookies)", path.display(), cookies.len());

        Ok(Self {
            path,
            cookies,
            budget_bytes,
        })
    }

    /// Opens the configured cookie file with the configured budget.
    pub fn from_config(config: &Config) -> io::Result<Self> {
        Self::open(&config.cookie_file, config.budget_bytes)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(&self.cookies)?;
        fs::write(&self.path, json)
    }
}

impl CookieStore for FileStore {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.value.clone())
    }

    fn write(&mut self, name: &str, value: &str, domain: Option<&str>) {
        let kept = fit_to_budget(name, value, self.budget_bytes);
        self.cookies.insert(
            name.to_string(),
            CookieRecord {
                value: kept.to_string(),
                domain: domain.map(str::to_string),
            },
        );
        // The in-memory copy stays authoritative for this process
        if let Err(err) = self.save() {
            warn!("failed to save cookie file {}: {}", self.path.display(), err);
        }
    }
}
