//! Store Module
//!
//! The per-name cookie persistence boundary a jar writes through to.
//!
//! A store behaves like a browser cookie mechanism: writes that exceed the
//! per-cookie budget are not rejected, they are silently cut down. The only
//! way a caller can tell is by reading the value back.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// == Cookie Store Trait ==
/// Per-name cookie read/write primitive.
pub trait CookieStore {
    /// Returns the stored value for `name`, if any.
    fn read(&self, name: &str) -> Option<String>;

    /// Stores `value` under `name` with a far-future expiry on the root path.
    ///
    /// May silently truncate `value` when the write exceeds the store's budget.
    fn write(&mut self, name: &str, value: &str, domain: Option<&str>);
}

// == Budget ==
/// Cuts `value` so that `name` + `value` fit in `budget_bytes`, never
/// splitting a character.
pub(crate) fn fit_to_budget<'a>(name: &str, value: &'a str, budget_bytes: usize) -> &'a str {
    let room = budget_bytes.saturating_sub(name.len());
    if value.len() <= room {
        return value;
    }
    let mut end = room;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
