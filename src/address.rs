// Copyright (c) 2024 Botho Foundation

//! Fixed-width account identifiers.
//!
//! An address is an opaque 36-byte string. Addresses are totally ordered
//! by lexicographic byte comparison, which is the order the wallet-state
//! checksum fold walks them in. The string form is uppercase hex; it is
//! also the form the mining challenge embeds, so it must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Width of every account identifier in bytes.
pub const ADDRESS_LEN: usize = 36;

/// Opaque fixed-width account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address length: expected 36 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid address hex: {0}")]
    InvalidHex(String),
}

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The well-known all-zero burn address that proof-of-work solution
    /// transactions are addressed to.
    pub fn burn() -> Self {
        Self([0u8; ADDRESS_LEN])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct AddressVisitor;

impl<'de> de::Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raw bytes", ADDRESS_LEN)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Address::from_slice(v).map_err(E::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(ADDRESS_LEN);
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Address::from_slice(&bytes).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(AddressVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_roundtrip() {
        let addr = Address::new([0xA7; ADDRESS_LEN]);
        let s = addr.to_string();
        assert_eq!(s.len(), ADDRESS_LEN * 2);
        assert_eq!(s, s.to_uppercase());
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_accepts_lowercase_hex() {
        let addr = Address::new([0xA7; ADDRESS_LEN]);
        let parsed: Address = addr.to_string().to_lowercase().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert_eq!(
            Address::from_slice(&[0u8; 35]),
            Err(AddressError::InvalidLength(35))
        );
        assert_eq!(
            Address::from_slice(&[0u8; 37]),
            Err(AddressError::InvalidLength(37))
        );
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut a = [0u8; ADDRESS_LEN];
        let mut b = [0u8; ADDRESS_LEN];
        a[0] = 1;
        b[0] = 2;
        assert!(Address::new(a) < Address::new(b));

        // First byte dominates later bytes
        let mut c = [0xFF; ADDRESS_LEN];
        c[0] = 1;
        assert!(Address::new(c) < Address::new(b));
    }

    #[test]
    fn test_bincode_roundtrip() {
        let addr = Address::new([0x3C; ADDRESS_LEN]);
        let bytes = bincode::serialize(&addr).unwrap();
        let back: Address = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_burn_address_is_all_zero() {
        assert_eq!(Address::burn().as_bytes(), &[0u8; ADDRESS_LEN]);
    }
}
