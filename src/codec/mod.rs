//! Codec Module
//!
//! Compact, cookie-safe encoding of jar entries.

pub mod entry;
pub mod numeric;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{
    classify, decode, encode, encode_expiry, entries, validate, Entries, Entry, Expiry, Layout,
};
pub use numeric::{decode_uint, digit_symbol, digit_value, encode_uint};
