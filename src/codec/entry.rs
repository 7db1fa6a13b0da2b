//! Entry Codec Module
//!
//! Packs one (key, value, expiry) triple into a self-delimiting run of bytes.
//!
//! ```text
//! micro:     [len:1][expiry:2][key][value]       key < 8, value < 8
//! standard: ![len:2][expiry:2][key][value]       key < 16, value < 256
//! ```
//!
//! The length header holds `key_len | value_len << 3` (micro) or
//! `key_len | value_len << 4` (standard). The expiry header holds
//! `small | scaled << 1` where `scaled` is hundredths of a day when `small`
//! is set and whole days otherwise, relative to the jar origin.

use crate::codec::numeric::{decode_digits, encode_uint};
use crate::error::{DecodeError, JarError, Result};

// == Format Constants ==
/// Keys must be shorter than this many bytes.
pub const MAX_KEY_LEN: usize = 16;

/// Values must be shorter than this many bytes.
pub const MAX_VALUE_LEN: usize = 256;

/// Relative expiries must be shorter than this many days.
pub const MAX_EXPIRY_DAYS: f64 = 2048.0;

/// Key and value must both be shorter than this for the micro layout.
pub const MICRO_LIMIT: usize = 8;

/// Marks a standard-layout entry.
pub const STANDARD_PREFIX: u8 = b'!';

/// Width of the expiry header in digits.
const EXPIRY_DIGITS: usize = 2;

/// Milliseconds per day.
pub const DAY_MS: u64 = 86_400_000;

// == Layout ==
/// Header layout of an encoded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No prefix, one-digit length header.
    Micro,
    /// `!` prefix, two-digit length header.
    Standard,
}

impl Layout {
    fn prefix_len(self) -> usize {
        match self {
            Layout::Micro => 0,
            Layout::Standard => 1,
        }
    }

    fn length_digits(self) -> usize {
        match self {
            Layout::Micro => 1,
            Layout::Standard => 2,
        }
    }

    /// Bits of the length header given to the key length.
    fn key_bits(self) -> u32 {
        match self {
            Layout::Micro => 3,
            Layout::Standard => 4,
        }
    }

    fn value_mask(self) -> u64 {
        match self {
            Layout::Micro => 0x07,
            Layout::Standard => 0xff,
        }
    }

    fn header_len(self) -> usize {
        self.prefix_len() + self.length_digits() + EXPIRY_DIGITS
    }
}

// == Classify ==
/// Picks the narrowest layout that can hold `key` and `value`.
pub fn classify(key: &str, value: &str) -> Layout {
    if key.len() < MICRO_LIMIT && value.len() < MICRO_LIMIT {
        Layout::Micro
    } else {
        Layout::Standard
    }
}

// == Expiry Field ==
/// Quantized, origin-relative expiry as stored in the expiry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// `scaled` counts hundredths of a day rather than days
    small: bool,
    /// 11-bit day count (or hundredths); zero means never
    scaled: u16,
}

impl Expiry {
    /// Quantizes a day count: hundredths below one day, whole days otherwise.
    ///
    /// `days` must already be validated to `0..MAX_EXPIRY_DAYS`.
    pub fn from_days(days: f64) -> Self {
        if days < 1.0 {
            Self {
                small: true,
                scaled: (days * 100.0).floor() as u16,
            }
        } else {
            Self {
                small: false,
                scaled: days.floor() as u16,
            }
        }
    }

    /// Smallest expiry that is not earlier than `offset_ms` after the origin.
    ///
    /// Below one day this rounds up to the next hundredth, otherwise to the
    /// next whole day, capped at the largest storable day count.
    pub fn covering(offset_ms: u64) -> Self {
        let hundredths = offset_ms.div_ceil(DAY_MS / 100).max(1);
        if hundredths < 100 {
            return Self {
                small: true,
                scaled: hundredths as u16,
            };
        }
        let days = offset_ms.div_ceil(DAY_MS).min(MAX_EXPIRY_DAYS as u64 - 1);
        Self {
            small: false,
            scaled: days as u16,
        }
    }

    fn from_header(header: u64) -> Self {
        Self {
            small: header & 1 == 1,
            scaled: ((header >> 1) & 0x7ff) as u16,
        }
    }

    fn header(self) -> u64 {
        u64::from(self.small) | (u64::from(self.scaled) << 1)
    }

    /// True when the entry never expires.
    pub fn is_never(self) -> bool {
        self.scaled == 0
    }

    /// The stored day count.
    pub fn days(self) -> f64 {
        if self.small {
            f64::from(self.scaled) / 100.0
        } else {
            f64::from(self.scaled)
        }
    }

    /// Absolute expiry in Unix milliseconds, or 0 for never.
    ///
    /// `None` if the expiry lies past `u64::MAX` milliseconds.
    pub fn resolve(self, origin_ms: u64) -> Option<u64> {
        if self.is_never() {
            return Some(0);
        }
        let offset = if self.small {
            u64::from(self.scaled) * (DAY_MS / 100)
        } else {
            u64::from(self.scaled) * DAY_MS
        };
        origin_ms.checked_add(offset)
    }
}

// == Entry ==
/// A decoded jar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// Absolute expiry (Unix milliseconds), 0 = never
    pub expires_at_ms: u64,
    /// Bytes this entry occupies in the packed string
    pub encoded_len: usize,
}

impl Entry {
    // == Is Expired ==
    /// An entry is expired once `now_ms` is strictly past its expiry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms != 0 && now_ms > self.expires_at_ms
    }
}

// == Validate ==
/// Checks that the triple is representable, regardless of layout.
pub fn validate(key: &str, value: &str, expiry_days: f64) -> Result<()> {
    if key.len() >= MAX_KEY_LEN {
        return Err(JarError::EntryTooLarge(format!(
            "key is {} bytes, must be under {}",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    if value.len() >= MAX_VALUE_LEN {
        return Err(JarError::EntryTooLarge(format!(
            "value is {} bytes, must be under {}",
            value.len(),
            MAX_VALUE_LEN
        )));
    }
    if !expiry_days.is_finite() || !(0.0..MAX_EXPIRY_DAYS).contains(&expiry_days) {
        return Err(JarError::EntryTooLarge(format!(
            "expiry of {} days is outside 0..{}",
            expiry_days, MAX_EXPIRY_DAYS
        )));
    }
    Ok(())
}

// == Encode ==
/// Encodes a triple. `expiry_days` is relative to the jar origin.
///
/// # Errors
/// `EntryTooLarge` if [`validate`] rejects the input.
pub fn encode(key: &str, value: &str, expiry_days: f64) -> Result<String> {
    validate(key, value, expiry_days)?;
    encode_expiry(key, value, Expiry::from_days(expiry_days))
}

/// Encodes a triple whose expiry is already quantized.
///
/// # Errors
/// `EntryTooLarge` if the key or value is too long.
pub fn encode_expiry(key: &str, value: &str, expiry: Expiry) -> Result<String> {
    validate(key, value, 0.0)?;

    let layout = classify(key, value);
    let lengths = key.len() as u64 | ((value.len() as u64) << layout.key_bits());

    let mut out = String::with_capacity(layout.header_len() + key.len() + value.len());
    if layout == Layout::Standard {
        out.push(char::from(STANDARD_PREFIX));
    }
    out.push_str(&encode_uint(lengths, layout.length_digits()));
    out.push_str(&encode_uint(expiry.header(), EXPIRY_DIGITS));
    out.push_str(key);
    out.push_str(value);
    Ok(out)
}

// == Decode ==
/// Decodes the entry at the start of `buffer`.
///
/// Returns the entry and the number of bytes it occupies. Trailing bytes
/// after the entry are ignored.
pub fn decode(buffer: &str, origin_ms: u64) -> std::result::Result<(Entry, usize), DecodeError> {
    let bytes = buffer.as_bytes();
    let layout = if bytes.first() == Some(&STANDARD_PREFIX) {
        Layout::Standard
    } else {
        Layout::Micro
    };

    let header_len = layout.header_len();
    if bytes.len() < header_len {
        return Err(DecodeError::Truncated {
            needed: header_len,
            available: bytes.len(),
        });
    }

    let lengths_at = layout.prefix_len();
    let expiry_at = lengths_at + layout.length_digits();
    let lengths = decode_digits(&bytes[lengths_at..expiry_at])?;
    let expiry = Expiry::from_header(decode_digits(&bytes[expiry_at..header_len])?);

    let key_len = (lengths & ((1 << layout.key_bits()) - 1)) as usize;
    let value_len = ((lengths >> layout.key_bits()) & layout.value_mask()) as usize;

    let key_end = header_len + key_len;
    let value_end = key_end + value_len;
    let out_of_bounds = || DecodeError::BodyOutOfBounds {
        start: header_len,
        end: value_end,
        len: bytes.len(),
    };
    let key = buffer.get(header_len..key_end).ok_or_else(out_of_bounds)?;
    let value = buffer.get(key_end..value_end).ok_or_else(out_of_bounds)?;

    let entry = Entry {
        key: key.to_string(),
        value: value.to_string(),
        expires_at_ms: expiry.resolve(origin_ms).ok_or(DecodeError::Overflow)?,
        encoded_len: value_end,
    };
    Ok((entry, value_end))
}

// == Entries ==
/// Sequential cursor over a packed string.
///
/// Yields each entry with its byte offset. On a malformed entry it yields one
/// `Err((offset, cause))` and then stops.
pub struct Entries<'a> {
    packed: &'a str,
    origin_ms: u64,
    offset: usize,
    done: bool,
}

/// Iterates the entries of `packed`, resolving expiries against `origin_ms`.
pub fn entries(packed: &str, origin_ms: u64) -> Entries<'_> {
    Entries {
        packed,
        origin_ms,
        offset: 0,
        done: false,
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = std::result::Result<(usize, Entry), (usize, DecodeError)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.packed.len() {
            return None;
        }
        let rest = self.packed.get(self.offset..)?;
        match decode(rest, self.origin_ms) {
            Ok((entry, consumed)) => {
                let at = self.offset;
                self.offset += consumed;
                Some(Ok((at, entry)))
            }
            Err(cause) => {
                self.done = true;
                Some(Err((self.offset, cause)))
            }
        }
    }
}
