//! Numeric Codec Module
//!
//! Base-64 digits for the integer fields of an encoded entry.
//!
//! The alphabet is `0-9`, `a-z`, `A-Z`, `_`, `-` (values 0..=63). It is not
//! RFC 4648 base64: digits come first so small numbers read like decimal,
//! and every symbol is legal inside a cookie value without escaping.

use crate::error::DecodeError;

// == Alphabet ==
const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Number of distinct digit values.
pub const RADIX: u64 = 64;

// == Digit Value ==
/// Converts an alphabet symbol to its value in `0..=63`.
///
/// Returns `None` for bytes outside the alphabet.
pub fn digit_value(symbol: u8) -> Option<u8> {
    match symbol {
        b'0'..=b'9' => Some(symbol - b'0'),
        b'a'..=b'z' => Some(symbol - b'a' + 10),
        b'A'..=b'Z' => Some(symbol - b'A' + 36),
        b'_' => Some(62),
        b'-' => Some(63),
        _ => None,
    }
}

// == Digit Symbol ==
/// Converts a value to its alphabet symbol. Only the low six bits are used.
pub fn digit_symbol(value: u8) -> u8 {
    ALPHABET[usize::from(value & 0x3f)]
}

// == Encode ==
/// Encodes `n` most-significant digit first, left-padded with `0` until it is
/// at least `min_digits` long.
///
/// # Arguments
/// * `n` - The number to encode
/// * `min_digits` - Minimum output length; shorter output is zero-padded
pub fn encode_uint(mut n: u64, min_digits: usize) -> String {
    let mut digits = Vec::with_capacity(min_digits.max(11));
    loop {
        digits.push(digit_symbol((n % RADIX) as u8));
        n /= RADIX;
        if n == 0 {
            break;
        }
    }
    while digits.len() < min_digits {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

// == Decode ==
/// Decodes a base-64 string produced by [`encode_uint`].
pub fn decode_uint(s: &str) -> Result<u64, DecodeError> {
    decode_digits(s.as_bytes())
}

/// Decodes raw digit bytes, most significant first.
pub(crate) fn decode_digits(digits: &[u8]) -> Result<u64, DecodeError> {
    digits.iter().try_fold(0u64, |acc, &symbol| {
        let value = digit_value(symbol).ok_or(DecodeError::InvalidDigit(char::from(symbol)))?;
        acc.checked_mul(RADIX)
            .and_then(|acc| acc.checked_add(u64::from(value)))
            .ok_or(DecodeError::Overflow)
    })
}
