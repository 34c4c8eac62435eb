// Copyright (c) 2024 Botho Foundation

//! Ixian-compatible distributed-ledger node core.
//!
//! This library provides the two consensus-critical pieces of the node:
//! the in-memory [`WalletState`] (checksum-addressable account map with
//! snapshot/commit/revert semantics for speculative block execution) and
//! the proof-of-work [`node::miner::Miner`] (Argon2id puzzle search over
//! unsealed blocks).
//!
//! Everything else the node is made of - the p2p transport, the block
//! processor, chain storage, the transaction pool, the local key store -
//! is a collaborator reached through the handle traits in [`node`].

#![deny(clippy::print_stdout)]

pub mod address;
pub mod amount;
pub mod block;
pub mod config;
pub mod crypto;
pub mod node;
pub mod telemetry;
pub mod transaction;
pub mod wallet;
pub mod wallet_state;

pub use address::Address;
pub use amount::IxiAmount;
pub use block::Block;
pub use node::miner::{find_unsealed_block, validate_hash, verify_nonce, Miner};
pub use node::{BlockProcessorView, ChainView, KeyStore, ProtocolCode, ProtocolSink};
pub use transaction::Transaction;
pub use wallet::Wallet;
pub use wallet_state::{WalletState, WalletStateError, WsChunk};
