//! Content addresses.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StorageError;

/// Length of every textual [`Address`].
pub const ADDRESS_LEN: usize = 46;

/// Multihash header for SHA2-256 with a 32-byte digest.
const MULTIHASH_SHA2_256: [u8; 2] = [0x12, 0x20];

/// Content address: base58btc encoding of a SHA-256 multihash.
///
/// The inner string is private so an `Address` is always exactly
/// [`ADDRESS_LEN`] characters and decodes to a SHA-256 multihash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Compute the address of the given bytes.
    pub fn for_content(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let mut multihash = Vec::with_capacity(34);
        multihash.extend_from_slice(&MULTIHASH_SHA2_256);
        multihash.extend_from_slice(&hasher.finalize());
        Address(bs58::encode(multihash).into_string())
    }

    /// Return the full address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..10]
    }
}

impl TryFrom<String> for Address {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let invalid = |reason: &str| StorageError::InvalidAddress {
            address: s.clone(),
            reason: reason.to_string(),
        };

        if s.len() != ADDRESS_LEN {
            return Err(invalid("wrong length"));
        }
        let bytes = bs58::decode(&s)
            .into_vec()
            .map_err(|_| invalid("not base58"))?;
        if bytes.len() != 34 || bytes[..2] != MULTIHASH_SHA2_256 {
            return Err(invalid("not a sha2-256 multihash"));
        }
        Ok(Address(s))
    }
}

impl std::str::FromStr for Address {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Address::try_from(s.to_string())
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_has_fixed_length() {
        for data in [&b""[..], b"sup", b"a much longer piece of content to hash"] {
            let address = Address::for_content(data);
            assert_eq!(address.as_str().len(), ADDRESS_LEN);
            assert!(address.as_str().starts_with("Qm"));
        }
    }

    #[test]
    fn test_address_deterministic() {
        assert_eq!(Address::for_content(b"x"), Address::for_content(b"x"));
        assert_ne!(Address::for_content(b"x"), Address::for_content(b"y"));
    }

    #[test]
    fn test_address_parse_accepts_valid() {
        let address = Address::for_content(b"valid");
        let parsed: Address = address.as_str().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_parse_rejects_wrong_length() {
        let err = "QmTooShort".parse::<Address>().unwrap_err();
        assert!(matches!(err, StorageError::InvalidAddress { .. }));
    }

    #[test]
    fn test_address_parse_rejects_non_base58() {
        // '0' and 'l' are outside the base58 alphabet
        let bogus = format!("Qm{}", "0l".repeat(22));
        assert_eq!(bogus.len(), ADDRESS_LEN);
        assert!(bogus.parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde_validates() {
        let address = Address::for_content(b"serde");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);

        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }
}
