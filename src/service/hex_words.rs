//! Helpers for reading 32-byte ABI words out of hex-encoded log fields.
//!
//! Every helper is total: malformed or short input yields the zero address,
//! `None`, or an empty buffer instead of an error.

use alloy_primitives::{Address, U256};

pub const WORD: usize = 32;

/// Lower bound (inclusive) for a data word to count as a score
pub const MIN_PLAUSIBLE_SCORE: u64 = 1;
/// Upper bound (inclusive) for a data word to count as a score
pub const MAX_PLAUSIBLE_SCORE: u64 = 1_000_000;

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decode a `0x`-prefixed (or bare) hex string. `None` on invalid hex.
pub fn hex_bytes(value: &str) -> Option<Vec<u8>> {
    hex::decode(strip_hex_prefix(value)).ok()
}

/// Bytes identifying an address-like string, or `None` when it is the zero
/// address.
///
/// Odd-length hex is read with an implied leading zero. Anything that is not
/// hex contributes its raw UTF-8 bytes. Empty input and strings made only of
/// `0` digits count as zero.
pub fn address_bytes(value: &str) -> Option<Vec<u8>> {
    let digits = strip_hex_prefix(value);
    if digits.bytes().all(|b| b == b'0') {
        return None;
    }

    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits)).ok()
    } else {
        hex::decode(digits).ok()
    };
    Some(decoded.unwrap_or_else(|| digits.as_bytes().to_vec()))
}

/// The `index`-th 32-byte word of `data`, if fully present
pub fn word(data: &[u8], index: usize) -> Option<&[u8]> {
    let start = index.checked_mul(WORD)?;
    data.get(start..start + WORD)
}

/// Address right-aligned in a 32-byte word
pub fn word_to_address(word: &[u8]) -> Address {
    if word.len() < WORD {
        return Address::ZERO;
    }
    Address::from_slice(&word[WORD - 20..WORD])
}

/// Big-endian unsigned integer in a word, saturating at `u64::MAX`
pub fn word_to_u64(word: &[u8]) -> u64 {
    let value = U256::from_be_slice(word);
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_limbs()[0]
    }
}

/// Address carried by an indexed topic; zero when the topic is missing,
/// shorter than a full word, or not hex.
pub fn topic_to_address(topic: Option<&String>) -> Address {
    topic
        .and_then(|t| hex_bytes(t))
        .filter(|bytes| bytes.len() >= WORD)
        .map(|bytes| word_to_address(&bytes[bytes.len() - WORD..]))
        .unwrap_or(Address::ZERO)
}

/// `0x`-prefixed lowercase rendering
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

pub fn is_plausible_score(value: u64) -> bool {
    (MIN_PLAUSIBLE_SCORE..=MAX_PLAUSIBLE_SCORE).contains(&value)
}

/// Low-order four bytes of an address-like byte string as a big-endian u32
fn low_u32(bytes: &[u8]) -> u32 {
    let tail = &bytes[bytes.len().saturating_sub(4)..];
    tail.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// Stand-in score derived from an address: `low bytes mod 10000 + 1000`
pub fn derived_score(address_bytes: &[u8]) -> u64 {
    u64::from(low_u32(address_bytes) % 10_000) + 1_000
}

/// Deterministic gap between a derived score and its previous score, 50..=249
pub fn derived_score_gap(address_bytes: &[u8]) -> u64 {
    u64::from(low_u32(address_bytes) % 200) + 50
}
