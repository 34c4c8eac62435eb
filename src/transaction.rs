// Copyright (c) 2024 Botho Foundation

//! Transaction envelope, including the proof-of-work solution form.
//!
//! A solution transaction carries `amount = 0` to the burn address and a
//! `pubkey||blockNum||nonce` payload in its data field. The `||`
//! delimiter and field order are wire contracts shared with every
//! deployed node; they must not change.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::amount::IxiAmount;

/// Delimiter of the proof-of-work payload fields.
pub const POW_PAYLOAD_SEPARATOR: &str = "||";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    Normal = 0,
    PowSolution = 1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: TxType,
    pub amount: IxiAmount,
    pub fee: IxiAmount,
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub timestamp: u64,
    pub id: String,
    pub checksum: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Build an unsigned proof-of-work solution transaction. The caller
    /// signs the checksum before handing it to the protocol layer.
    pub fn pow_solution(
        solver: Address,
        public_key: &[u8],
        block_num: u64,
        nonce: &str,
        timestamp: u64,
    ) -> Self {
        let mut tx = Self {
            tx_type: TxType::PowSolution,
            amount: IxiAmount::zero(),
            fee: IxiAmount::zero(),
            from: solver,
            to: Address::burn(),
            data: Self::pow_payload(public_key, block_num, nonce),
            timestamp,
            id: String::new(),
            checksum: Vec::new(),
            signature: Vec::new(),
        };
        tx.checksum = tx.calculate_checksum().to_vec();
        tx.id = hex::encode_upper(&tx.checksum);
        tx
    }

    /// Deterministic checksum over the signed fields.
    pub fn calculate_checksum(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.tx_type as u8]);
        hasher.update(self.amount.to_string().as_bytes());
        hasher.update(self.fee.to_string().as_bytes());
        hasher.update(self.from.as_bytes());
        hasher.update(self.to.as_bytes());
        hasher.update(&self.data);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    /// The `pubkey||blockNum||nonce` solution payload.
    pub fn pow_payload(public_key: &[u8], block_num: u64, nonce: &str) -> Vec<u8> {
        format!(
            "{}{sep}{}{sep}{}",
            hex::encode_upper(public_key),
            block_num,
            nonce,
            sep = POW_PAYLOAD_SEPARATOR,
        )
        .into_bytes()
    }

    /// Split a solution payload back into its fields. `None` when the
    /// payload is not exactly three `||`-separated parts.
    pub fn parse_pow_payload(data: &[u8]) -> Option<(Vec<u8>, u64, String)> {
        let s = std::str::from_utf8(data).ok()?;
        let mut parts = s.split(POW_PAYLOAD_SEPARATOR);
        let public_key = hex::decode(parts.next()?).ok()?;
        let block_num = parts.next()?.parse().ok()?;
        let nonce = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some((public_key, block_num, nonce))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ADDRESS_LEN;

    fn solver() -> Address {
        Address::new([0x11; ADDRESS_LEN])
    }

    #[test]
    fn test_pow_payload_wire_format() {
        let payload = Transaction::pow_payload(&[0xAB, 0xCD], 1234, "NONCE");
        assert_eq!(payload, b"ABCD||1234||NONCE");
    }

    #[test]
    fn test_pow_payload_roundtrip() {
        let nonce = "X9".repeat(64);
        let payload = Transaction::pow_payload(&[1, 2, 3], 987_654, &nonce);
        let (pk, block_num, parsed_nonce) = Transaction::parse_pow_payload(&payload).unwrap();
        assert_eq!(pk, vec![1, 2, 3]);
        assert_eq!(block_num, 987_654);
        assert_eq!(parsed_nonce, nonce);
    }

    #[test]
    fn test_parse_pow_payload_rejects_malformed() {
        assert!(Transaction::parse_pow_payload(b"ABCD||12").is_none());
        assert!(Transaction::parse_pow_payload(b"ABCD||12||N||extra").is_none());
        assert!(Transaction::parse_pow_payload(b"nothex||12||N").is_none());
        assert!(Transaction::parse_pow_payload(b"ABCD||notanum||N").is_none());
        assert!(Transaction::parse_pow_payload(&[0xFF, 0xFE]).is_none());
    }

    #[test]
    fn test_pow_solution_shape() {
        let tx = Transaction::pow_solution(solver(), &[0xAB; 33], 55, "NONCE", 1_700_000_000);
        assert_eq!(tx.tx_type, TxType::PowSolution);
        assert!(tx.amount.is_zero());
        assert_eq!(tx.to, Address::burn());
        assert_eq!(tx.checksum, tx.calculate_checksum().to_vec());
        assert_eq!(tx.id, hex::encode_upper(&tx.checksum));
        assert!(tx.signature.is_empty());
    }

    #[test]
    fn test_checksum_covers_payload() {
        let a = Transaction::pow_solution(solver(), &[0xAB; 33], 55, "NONCE", 1_700_000_000);
        let b = Transaction::pow_solution(solver(), &[0xAB; 33], 56, "NONCE", 1_700_000_000);
        assert_ne!(a.checksum, b.checksum);
    }

    #[test]
    fn test_bincode_roundtrip() {
        let tx = Transaction::pow_solution(solver(), &[0xAB; 33], 55, "NONCE", 1_700_000_000);
        let bytes = tx.to_bytes().unwrap();
        let back = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(back, tx);
    }
}
