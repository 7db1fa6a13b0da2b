//! Error types for the cookie jar
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Jar Error Enum ==
/// Errors surfaced by jar operations.
///
/// Each variant maps to a short, stable code (see [`JarError::code`]) that
/// consuming code may branch on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JarError {
    /// Key, value or expiry is outside what the entry format can represent.
    /// Raised before the jar is touched.
    #[error("Entry too large: {0}")]
    EntryTooLarge(String),

    /// The store truncated the packed string on write. The jar has been
    /// restored to its state before the failing call.
    #[error("Jar full: {0}")]
    JarFull(String),
}

impl JarError {
    // == Error Code ==
    /// Returns the stable short code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            JarError::EntryTooLarge(_) => "entry_too_large",
            JarError::JarFull(_) => "jar_full",
        }
    }
}

// == Decode Error Enum ==
/// Reasons a packed string could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended inside an entry header.
    #[error("truncated header: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// A header byte is not one of the 64 alphabet symbols.
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),

    /// A numeric field does not fit in 64 bits.
    #[error("numeric field overflows u64")]
    Overflow,

    /// The key/value body runs past the end of the buffer or splits a character.
    #[error("entry body {start}..{end} out of bounds for buffer of {len} bytes")]
    BodyOutOfBounds { start: usize, end: usize, len: usize },
}

// == Result Type Alias ==
/// Convenience Result type for jar operations.
pub type Result<T> = std::result::Result<T, JarError>;
