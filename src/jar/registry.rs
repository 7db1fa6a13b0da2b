//! Jar Registry Module
//!
//! Get-or-create map from jar name to a shared jar handle, so every call
//! site that opens the same name sees the same cache and packed string.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::jar::Jar;
use crate::store::CookieStore;

/// Shared handle to an open jar.
pub type JarHandle<S> = Rc<RefCell<Jar<S>>>;

// == Jar Registry ==
/// Owns the store, the clock and every jar opened through it.
pub struct JarRegistry<S: CookieStore> {
    store: Rc<RefCell<S>>,
    clock: Rc<dyn Clock>,
    /// Domain used when `open` is given none
    default_domain: Option<String>,
    jars: HashMap<String, JarHandle<S>>,
}

impl<S: CookieStore> JarRegistry<S> {
    // == Constructor ==
    /// Creates a registry over `store` using wall-clock time.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Rc::new(SystemClock))
    }

    /// Creates a registry over `store` with an explicit time source.
    pub fn with_clock(store: S, clock: Rc<dyn Clock>) -> Self {
        Self {
            store: Rc::new(RefCell::new(store)),
            clock,
            default_domain: None,
            jars: HashMap::new(),
        }
    }

    /// Creates a registry that applies the configured default domain.
    pub fn from_config(store: S, config: &Config) -> Self {
        let mut registry = Self::new(store);
        registry.default_domain = config.domain.clone();
        registry
    }

    // == Open ==
    /// Returns the jar called `name`, loading or creating it on first use.
    ///
    /// `domain` only applies when the jar is first opened; later calls get
    /// the existing instance unchanged.
    ///
    /// # Errors
    /// `JarFull` if a new jar's origin entry cannot be written.
    pub fn open(&mut self, name: &str, domain: Option<&str>) -> Result<JarHandle<S>> {
        if let Some(handle) = self.jars.get(name) {
            return Ok(Rc::clone(handle));
        }

        let domain = domain.or(self.default_domain.as_deref());
        let jar = Jar::open(name, domain, Rc::clone(&self.store), Rc::clone(&self.clock))?;
        let handle = Rc::new(RefCell::new(jar));
        self.jars.insert(name.to_string(), Rc::clone(&handle));
        debug!("registered jar {} ({} open)", name, self.jars.len());

        Ok(handle)
    }

    /// The store shared by every jar in this registry.
    pub fn store(&self) -> &Rc<RefCell<S>> {
        &self.store
    }

    // == Length ==
    /// Returns the number of open jars.
    pub fn len(&self) -> usize {
        self.jars.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.jars.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn registry() -> JarRegistry<MemoryStore> {
        JarRegistry::with_clock(
            MemoryStore::default(),
            Rc::new(ManualClock::new(1_700_000_000_000)),
        )
    }

    #[test]
    fn test_registry_new() {
        let registry = registry();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_open_same_name_returns_same_jar() {
        let mut registry = registry();

        let a = registry.open("jar", None).unwrap();
        let b = registry.open("jar", None).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        a.borrow_mut().set("hello", "world", 0.0).unwrap();
        assert_eq!(b.borrow_mut().get("hello").as_deref(), Some("world"));
    }

    #[test]
    fn test_open_different_names_are_independent() {
        let mut registry = registry();

        let a = registry.open("first", None).unwrap();
        let b = registry.open("second", None).unwrap();
        a.borrow_mut().set("k", "a", 0.0).unwrap();

        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(b.borrow_mut().get("k"), None);
        assert_eq!(registry.store().borrow().len(), 2);
    }

    #[test]
    fn test_default_domain_from_config() {
        let config = Config {
            domain: Some("example.com".to_string()),
            ..Config::default()
        };
        let mut registry = JarRegistry::from_config(MemoryStore::from_config(&config), &config);

        let jar = registry.open("jar", None).unwrap();
        assert_eq!(jar.borrow().domain(), Some("example.com"));

        let other = registry.open("other", Some("other.org")).unwrap();
        assert_eq!(other.borrow().domain(), Some("other.org"));
    }

    #[test]
    fn test_open_fails_when_store_too_small() {
        let mut registry =
            JarRegistry::with_clock(MemoryStore::new(4), Rc::new(ManualClock::new(1_000)));

        let err = registry.open("jar", None).err().unwrap();
        assert_eq!(err.code(), "jar_full");
        assert!(registry.is_empty());
    }
}
