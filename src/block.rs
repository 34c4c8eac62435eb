use serde::{Deserialize, Serialize};

/// The read-only view of a block the mining side consumes.
///
/// The full block (transactions, signatures, superblock fields) lives in
/// chain storage; the miner only needs the number, the header checksum
/// it solves against, the difficulty, and the proof-of-work slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height of the block in the chain.
    pub block_num: u64,

    /// Header checksum the Argon2id challenge is built from.
    pub block_checksum: Vec<u8>,

    /// Leading-zero-bit count a solution hash must meet.
    pub difficulty: u64,

    /// Proof-of-work slot. Empty until a solution seals the block.
    pub pow_field: Vec<u8>,
}

impl Block {
    pub fn new(block_num: u64, block_checksum: Vec<u8>, difficulty: u64) -> Self {
        Self {
            block_num,
            block_checksum,
            difficulty,
            pow_field: Vec::new(),
        }
    }

    /// A block is sealed once its proof-of-work slot is non-empty.
    pub fn is_sealed(&self) -> bool {
        !self.pow_field.is_empty()
    }
}
