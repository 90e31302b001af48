//! Base62 codec used to turn allocated integers into short codes.
//!
//! The alphabet is ordered `a-z`, `A-Z`, `0-9`, so index 0 is `'a'` and
//! `encode(1) == "b"`. Digits are written most-significant first.

/// The 62 symbols a generated short code is made of.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BASE: u64 = ALPHABET.len() as u64;

/// Enough digits for `u64::MAX` in base 62.
const MAX_DIGITS: usize = 11;

/// Encodes a positive integer as a base62 string.
///
/// Zero and negative numbers encode to the empty string. Zero never shows
/// up in practice because allocated intervals start at 1.
///
/// ```
/// use keyspan_core::base62::encode;
///
/// assert_eq!(encode(1), "b");
/// assert_eq!(encode(1_000_000), "emjc");
/// assert_eq!(encode(0), "");
/// assert_eq!(encode(-4), "");
/// ```
pub fn encode<N: TryInto<u64>>(n: N) -> String {
    let Ok(mut n) = n.try_into() else {
        return String::new();
    };

    let mut digits = [0u8; MAX_DIGITS];
    let mut start = MAX_DIGITS;
    while n > 0 {
        start -= 1;
        digits[start] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    // Every byte comes from ALPHABET, which is ASCII.
    digits[start..].iter().map(|&b| b as char).collect()
}

/// Decodes a base62 string back into the integer it was encoded from.
///
/// Returns `None` for the empty string, for symbols outside [`ALPHABET`]
/// and for values that do not fit in a `u64`.
pub fn decode(code: &str) -> Option<u64> {
    if code.is_empty() {
        return None;
    }

    code.bytes().try_fold(0u64, |acc, b| {
        let digit = symbol_index(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

/// Returns true if `b` is one of the 62 code symbols.
pub fn is_symbol(b: u8) -> bool {
    symbol_index(b).is_some()
}

fn symbol_index(b: u8) -> Option<u64> {
    let index = match b {
        b'a'..=b'z' => b - b'a',
        b'A'..=b'Z' => b - b'A' + 26,
        b'0'..=b'9' => b - b'0' + 52,
        _ => return None,
    };
    Some(u64::from(index))
}
