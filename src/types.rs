//! Validator identities and the signed artifacts carried through dispatch.
//!
//! Artifacts are opaque to the dispatch core: they are produced and signed
//! upstream and handed as-is to the remote API channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of characters kept by the abbreviated display form (`0x` + 5 hex digits).
const ABBREVIATED_LEN: usize = 7;

/// A string that is not a hex-encoded public key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid validator key {key:?}: {reason}")]
pub struct InvalidValidatorKey {
    pub key: String,
    pub reason: String,
}

/// A validator identity: the `0x`-prefixed hex encoding of its BLS public key.
///
/// Always lowercase ASCII hex. Parsing and deserialization both normalize the
/// prefix and case, and reject anything that is not valid hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidatorKey(String);

impl ValidatorKey {
    /// Build a key from raw public key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Full hex form, including the `0x` prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ValidatorKey {
    type Err = InvalidValidatorKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let invalid = |reason: String| InvalidValidatorKey {
            key: value.to_string(),
            reason,
        };

        if digits.is_empty() {
            return Err(invalid("empty".to_string()));
        }
        let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;
        Ok(Self::from_bytes(&bytes))
    }
}

impl TryFrom<String> for ValidatorKey {
    type Error = InvalidValidatorKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValidatorKey> for String {
    fn from(key: ValidatorKey) -> Self {
        key.0
    }
}

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abbreviated: String = self.0.chars().take(ABBREVIATED_LEN).collect();
        f.write_str(&abbreviated)
    }
}

/// A single signed attestation, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttestation {
    pub validator_index: u64,
    pub slot: u64,
    pub committee_index: u64,
    pub beacon_block_root: String,
    pub signature: String,
}

/// A signed aggregate-and-proof, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAggregateAndProof {
    pub aggregator_index: u64,
    pub aggregate: SignedAttestation,
    pub selection_proof: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex: &str) -> ValidatorKey {
        hex.parse().unwrap()
    }

    #[test]
    fn test_from_bytes_is_prefixed_lowercase_hex() {
        let key = ValidatorKey::from_bytes(&[0xAB, 0xCD, 0x01]);
        assert_eq!(key.as_str(), "0xabcd01");
    }

    #[test]
    fn test_parse_normalizes_prefix_and_case() {
        assert_eq!(key("ABCDEF"), key("0xabcdef"));
        assert_eq!(key("0xABCDEF").as_str(), "0xabcdef");
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!("0xaaaa\u{e9}".parse::<ValidatorKey>().is_err());
        assert!("0xzz".parse::<ValidatorKey>().is_err());
        assert!("0xabc".parse::<ValidatorKey>().is_err());
        assert!("0x".parse::<ValidatorKey>().is_err());
    }

    #[test]
    fn test_display_is_abbreviated() {
        assert_eq!(key("0xa1b2c3d4e5f6").to_string(), "0xa1b2c");
    }

    #[test]
    fn test_display_of_short_key_is_not_truncated() {
        assert_eq!(key("0x12").to_string(), "0x12");
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&key("0xbeef")).unwrap(), "\"0xbeef\"");
    }

    #[test]
    fn test_deserialize_normalizes_like_parse() {
        let key: ValidatorKey = serde_json::from_str("\"0xAA01\"").unwrap();
        assert_eq!(key, "0xaa01".parse::<ValidatorKey>().unwrap());
    }

    #[test]
    fn test_deserialize_rejects_non_hex() {
        let result: Result<ValidatorKey, _> = serde_json::from_str("\"0xaaaa\u{e9}\"");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid validator key"));
    }
}
