mod chunk;
mod store;

pub use chunk::WsChunk;
pub use store::{WalletState, STATE_CHECKSUM_SEED};

use thiserror::Error;

use crate::address::Address;

/// Failures of wallet-state operations.
///
/// Every failing operation is a no-op on the state; callers that ignore
/// the error observe the historical log-and-drop behavior, but consensus
/// code must check it so replicas never diverge silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletStateError {
    #[error("no snapshot is active")]
    NoActiveSnapshot,

    #[error("operation refused while a snapshot is active")]
    SnapshotActive,

    #[error("unknown wallet: {0}")]
    UnknownWallet(Address),
}
