// Copyright (c) 2024 Botho Foundation

//! Account records and their consensus checksum.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::amount::IxiAmount;

/// A single account record.
///
/// Wallets are created on first balance write (or via genesis / a sync
/// chunk) and persist indefinitely; there is no deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Address,
    pub balance: IxiAmount,
    pub nonce: u64,
    pub data: Vec<u8>,
}

impl Wallet {
    pub fn new(id: Address, balance: IxiAmount) -> Self {
        Self {
            id,
            balance,
            nonce: 0,
            data: Vec::new(),
        }
    }

    /// Zero-initialized record, the value reads of missing addresses
    /// resolve to.
    pub fn empty(id: Address) -> Self {
        Self::new(id, IxiAmount::zero())
    }

    /// Deterministic checksum over the serialized fields. Feeds the
    /// wallet-state checksum fold, so the field order and the canonical
    /// decimal balance string are consensus-fixed.
    pub fn checksum(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.balance.to_string().as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }
}
