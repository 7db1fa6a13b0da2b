//! Packed Jar - many small key/value pairs in a single cookie
//!
//! Provides a compact entry encoding with relative expiries, and jars that
//! pack entries into one cookie value with lazy expiry and truncation checks.

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod jar;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{DecodeError, JarError, Result};
pub use jar::{Jar, JarHandle, JarRegistry, JarStats, StoredValue};
pub use store::{CookieStore, FileStore, MemoryStore};
