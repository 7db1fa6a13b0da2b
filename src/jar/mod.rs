//! Jar Module
//!
//! Named cookie jars holding packed entries, and the registry that hands
//! them out.

#[allow(clippy::module_inception)]
mod jar;
mod registry;
mod stats;

// Re-export public types
pub use jar::{Jar, StoredValue, ORIGIN_KEY};
pub use registry::{JarHandle, JarRegistry};
pub use stats::JarStats;
