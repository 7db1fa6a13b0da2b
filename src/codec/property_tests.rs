//! Property-Based Tests for Codec Module
//!
//! Uses proptest to check the numeric and entry encodings over broad input ranges.

use proptest::prelude::*;

use crate::codec::entry::{MAX_KEY_LEN, MAX_VALUE_LEN, MICRO_LIMIT};
use crate::codec::{classify, decode, decode_uint, encode, encode_uint, entries, Layout};

// == Test Configuration ==
/// 2016-06-26T00:00:00+05:30
const ORIGIN: u64 = 1466879400000;
const DAY_MS: f64 = 86_400_000.0;

// == Strategies ==
/// Generates valid keys, either layout
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ .-]{0,15}".prop_map(|s| s)
}

/// Generates valid values, either layout
fn valid_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,7}".prop_map(|s| s),
        "[a-zA-Z0-9 =;,]{0,255}".prop_map(|s| s),
    ]
}

/// Generates expiries across both the sub-day and whole-day ranges
fn valid_expiry_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0f64..1.0, 1.0f64..2048.0]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Every integer below 64^6 survives a trip through the alphabet.
    #[test]
    fn prop_numeric_roundtrip(n in 0u64..(1u64 << 36)) {
        let encoded = encode_uint(n, 0);
        prop_assert_eq!(decode_uint(&encoded).unwrap(), n);
    }

    // Padding never changes the value and always reaches the target width.
    #[test]
    fn prop_numeric_padding(n in 0u64..4096, min_digits in 0usize..8) {
        let encoded = encode_uint(n, min_digits);
        prop_assert!(encoded.len() >= min_digits);
        prop_assert_eq!(decode_uint(&encoded).unwrap(), n);
    }

    // Key and value come back unchanged; expiry within the stored precision.
    #[test]
    fn prop_entry_roundtrip(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        days in valid_expiry_strategy()
    ) {
        let encoded = encode(&key, &value, days).unwrap();
        let (entry, consumed) = decode(&encoded, ORIGIN).unwrap();

        prop_assert_eq!(&entry.key, &key);
        prop_assert_eq!(&entry.value, &value);
        prop_assert_eq!(consumed, encoded.len());
        prop_assert_eq!(entry.encoded_len, encoded.len());

        let expected = if days < 1.0 { (days * 100.0).floor() / 100.0 } else { days.floor() };
        if expected == 0.0 {
            prop_assert_eq!(entry.expires_at_ms, 0);
        } else {
            let decoded_days = (entry.expires_at_ms - ORIGIN) as f64 / DAY_MS;
            let tolerance = if days < 1.0 { 0.01 } else { 1.0 };
            prop_assert!((decoded_days - days).abs() <= tolerance + 1e-9,
                "decoded {} days, encoded {}", decoded_days, days);
            prop_assert!((decoded_days - expected).abs() < 1e-9);
        }
    }

    // The `!` prefix appears exactly when the standard layout is chosen.
    #[test]
    fn prop_layout_prefix(key in valid_key_strategy(), value in valid_value_strategy()) {
        let encoded = encode(&key, &value, 0.0).unwrap();
        let micro = key.len() < MICRO_LIMIT && value.len() < MICRO_LIMIT;
        prop_assert_eq!(classify(&key, &value) == Layout::Micro, micro);
        prop_assert_eq!(encoded.starts_with('!'), !micro);
    }

    // Oversized keys or values are always rejected.
    #[test]
    fn prop_oversized_rejected(extra in 0usize..64) {
        let key = "k".repeat(MAX_KEY_LEN + extra);
        let value = "v".repeat(MAX_VALUE_LEN + extra);
        prop_assert!(encode(&key, "v", 0.0).is_err());
        prop_assert!(encode("k", &value, 0.0).is_err());
    }

    // Concatenated entries are recovered in order by the cursor.
    #[test]
    fn prop_packed_sequence(
        triples in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy(), valid_expiry_strategy()),
            0..20
        )
    ) {
        let packed: String = triples
            .iter()
            .map(|(key, value, days)| encode(key, value, *days).unwrap())
            .collect();

        let decoded: Vec<(String, String)> = entries(&packed, ORIGIN)
            .map(|item| item.map(|(_, entry)| (entry.key, entry.value)).unwrap())
            .collect();
        let expected: Vec<(String, String)> = triples
            .into_iter()
            .map(|(key, value, _)| (key, value))
            .collect();
        prop_assert_eq!(decoded, expected);
    }
}
