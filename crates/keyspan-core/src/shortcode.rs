use crate::base62;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An opaque short code identifying a [`Link`](crate::Link).
///
/// Short codes are 1-32 symbols from the base62 alphabet. Generated codes
/// come straight out of [`base62::encode`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

const MAX_LENGTH: usize = 32;

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    pub fn new(code: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. generators that are guaranteed to produce valid output).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Encodes an allocated integer as a short code.
    ///
    /// Fails for zero, which has no symbols.
    pub fn from_value(value: u64) -> std::result::Result<Self, CoreError> {
        if value == 0 {
            return Err(CoreError::InvalidShortCode(
                "zero does not encode to a short code".to_string(),
            ));
        }
        Ok(Self(base62::encode(value)))
    }

    /// The integer this code was encoded from, if it is a canonical encoding.
    pub fn value(&self) -> Option<u64> {
        base62::decode(&self.0).filter(|&value| base62::encode(value) == self.0)
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> std::result::Result<(), CoreError> {
        if code.is_empty() || code.len() > MAX_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between 1 and {}, got {}",
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(base62::is_symbol) {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only ASCII letters and digits: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        assert!(ShortCode::new("b").is_ok());
        assert!(ShortCode::new("Abc123xyz").is_ok());
        assert!(ShortCode::new("a".repeat(32)).is_ok());
    }

    #[test]
    fn empty_is_rejected() {
        assert!(ShortCode::new("").is_err());
    }

    #[test]
    fn too_long() {
        assert!(ShortCode::new("a".repeat(33)).is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(ShortCode::new("abc def").is_err());
        assert!(ShortCode::new("abc/def").is_err());
        assert!(ShortCode::new("abc-def").is_err());
        assert!(ShortCode::new("abc_def").is_err());
    }

    #[test]
    fn from_value_encodes_base62() {
        assert_eq!(ShortCode::from_value(1).unwrap().as_str(), "b");
        assert_eq!(ShortCode::from_value(1_000_000).unwrap().as_str(), "emjc");
        assert!(ShortCode::from_value(0).is_err());
    }

    #[test]
    fn value_round_trips_canonical_codes_only() {
        let code = ShortCode::from_value(4_100_001).unwrap();
        assert_eq!(code.value(), Some(4_100_001));

        // "ab" decodes to 1, but "b" is the canonical encoding.
        assert_eq!(ShortCode::new("ab").unwrap().value(), None);
    }

    #[test]
    fn to_url_joins_base() {
        let code = ShortCode::new("rML7").unwrap();
        assert_eq!(code.to_url("https://ks.io"), "https://ks.io/rML7");
        assert_eq!(code.to_url("https://ks.io/"), "https://ks.io/rML7");
    }

    #[test]
    fn serde_validates() {
        let code: ShortCode = serde_json::from_str("\"emjc\"").unwrap();
        assert_eq!(code.as_str(), "emjc");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"emjc\"");
        assert!(serde_json::from_str::<ShortCode>("\"no way\"").is_err());
    }
}
