//! In-memory cookie store.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{Config, DEFAULT_BUDGET_BYTES};
use crate::store::{fit_to_budget, CookieStore};

// == Stored Cookie ==
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    value: String,
    domain: Option<String>,
}

// == Memory Store ==
/// Process-local store with browser-like truncation.
#[derive(Debug)]
pub struct MemoryStore {
    cookies: HashMap<String, StoredCookie>,
    budget_bytes: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `budget_bytes` - Maximum bytes of name + value per cookie
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            cookies: HashMap::new(),
            budget_bytes,
        }
    }

    /// Creates an empty store using the configured budget.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.budget_bytes)
    }

    /// Domain the cookie `name` was last written with.
    pub fn domain_of(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).and_then(|c| c.domain.as_deref())
    }

    /// Overwrites a cookie without the budget check, as another writer
    /// sharing the store would.
    pub fn force(&mut self, name: &str, value: &str) {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                domain: None,
            },
        );
    }

    // == Length ==
    /// Returns the number of cookies held.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }
}

impl CookieStore for MemoryStore {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.value.clone())
    }

    fn write(&mut self, name: &str, value: &str, domain: Option<&str>) {
        let kept = fit_to_budget(name, value, self.budget_bytes);
        if kept.len() < value.len() {
            debug!(
                "cookie {} truncated from {} to {} bytes",
                name,
                value.len(),
                kept.len()
            );
        }
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: kept.to_string(),
                domain: domain.map(str::to_string),
            },
        );
    }
}
