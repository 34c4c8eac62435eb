// Copyright (c) 2024 Botho Foundation

//! Chunked export of the committed wallet map for state sync.
//!
//! A syncing node requests the full wallet set at a given block height
//! and receives it as a sequence of chunks. Chunks may arrive in any
//! order; consumers reconcile by checksum, not by chunk number.

use serde::{Deserialize, Serialize};

use crate::wallet::Wallet;

/// One slice of the committed wallet map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsChunk {
    /// Block height the export was taken at.
    pub block_num: u64,

    /// Position of this chunk within the export.
    pub chunk_num: i32,

    pub wallets: Vec<Wallet>,
}

impl WsChunk {
    pub fn new(block_num: u64, chunk_num: i32, wallets: Vec<Wallet>) -> Self {
        Self {
            block_num,
            chunk_num,
            wallets,
        }
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
    use crate::address::{Address, ADDRESS_LEN};
    use crate::amount::IxiAmount;

    #[test]
    fn test_wire_roundtrip() {
        let wallets = vec![
            Wallet::new(Address::new([1; ADDRESS_LEN]), IxiAmount::from_whole(10)),
            Wallet::new(Address::new([2; ADDRESS_LEN]), "0.5".parse().unwrap()),
        ];
        let chunk = WsChunk::new(77, 3, wallets);

        let bytes = chunk.to_bytes().unwrap();
        let back = WsChunk::from_bytes(&bytes).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn test_rejects_truncated_bytes() {
        let chunk = WsChunk::new(1, 0, Vec::new());
        let bytes = chunk.to_bytes().unwrap();
        assert!(WsChunk::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
