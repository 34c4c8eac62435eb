use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use super::{WalletStateError, WsChunk};
use crate::address::Address;
use crate::amount::IxiAmount;
use crate::crypto::sha256;
use crate::wallet::Wallet;

/// Seed of the state checksum fold. Fixed by consensus.
pub const STATE_CHECKSUM_SEED: &[u8] = b"IXIAN-DLT";

/// Committed map, pending overlay, and the memoized checksums.
///
/// The delta map exists exactly while a snapshot is active and holds
/// only the wallets modified since the snapshot was taken. A sorted map
/// keeps the iteration order the checksum fold requires structural.
#[derive(Debug, Clone, Default)]
struct StateInner {
    base: BTreeMap<Address, Wallet>,
    delta: Option<BTreeMap<Address, Wallet>>,
    cached_checksum: Option<Vec<u8>>,
    cached_delta_checksum: Option<Vec<u8>>,
}

/// The authoritative in-memory view of all account balances.
///
/// The block processor drives the speculative-execution cycle: it takes
/// a snapshot, applies a proposed block against the overlay, reads the
/// resulting `checksum(true)` for the block header, then commits or
/// reverts. Every operation serializes under one mutex and reads hand
/// out copies, never references into the maps.
#[derive(Debug, Default)]
pub struct WalletState {
    inner: Mutex<StateInner>,
}

impl WalletState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        // A poisoning panic can only have happened outside a mutation
        // (all writes below are single insert/remove steps), so the
        // inner state is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read a wallet by the overlay rule. Missing addresses resolve to
    /// a zero-initialized record carrying `id`.
    pub fn get(&self, id: &Address, from_snapshot: bool) -> Wallet {
        let inner = self.lock();
        inner
            .read_wallet(id, from_snapshot)
            .cloned()
            .unwrap_or_else(|| Wallet::empty(*id))
    }

    pub fn get_balance(&self, id: &Address, from_snapshot: bool) -> IxiAmount {
        self.get(id, from_snapshot).balance
    }

    /// Write a balance into the base map or the active overlay.
    ///
    /// Targeting the overlay without an active snapshot is a caller
    /// error: the write is dropped and reported, the state is untouched.
    pub fn set_balance(
        &self,
        id: &Address,
        balance: IxiAmount,
        to_snapshot: bool,
        nonce: Option<u64>,
    ) -> Result<(), WalletStateError> {
        let mut inner = self.lock();
        if to_snapshot && inner.delta.is_none() {
            warn!(wallet = %id, "balance write targeted a snapshot but none is active");
            return Err(WalletStateError::NoActiveSnapshot);
        }

        let data = inner
            .read_wallet(id, to_snapshot)
            .map(|w| w.data.clone())
            .unwrap_or_default();
        inner.write_wallet(
            Wallet {
                id: *id,
                balance,
                nonce: nonce.unwrap_or(0),
                data,
            },
            to_snapshot,
        );
        Ok(())
    }

    /// Rewrite an existing wallet with a new nonce, preserving balance
    /// and data. Unknown wallets are reported and left untouched.
    pub fn set_nonce(
        &self,
        id: &Address,
        nonce: u64,
        to_snapshot: bool,
    ) -> Result<(), WalletStateError> {
        let mut inner = self.lock();
        if to_snapshot && inner.delta.is_none() {
            warn!(wallet = %id, "nonce write targeted a snapshot but none is active");
            return Err(WalletStateError::NoActiveSnapshot);
        }

        let Some(existing) = inner.read_wallet(id, to_snapshot).cloned() else {
            warn!(wallet = %id, "nonce write for a wallet that does not exist");
            return Err(WalletStateError::UnknownWallet(*id));
        };
        inner.write_wallet(
            Wallet {
                nonce,
                ..existing
            },
            to_snapshot,
        );
        Ok(())
    }

    /// Open an empty overlay. Returns false (and changes nothing) when
    /// a snapshot is already active; snapshots do not nest.
    pub fn snapshot(&self) -> bool {
        let mut inner = self.lock();
        if inner.delta.is_some() {
            warn!("snapshot requested while one is already active");
            return false;
        }
        inner.delta = Some(BTreeMap::new());
        true
    }

    /// Fold the overlay into the base map and drop it. Both memoized
    /// checksums are cleared unconditionally, even for an empty overlay.
    pub fn commit(&self) {
        let mut inner = self.lock();
        if let Some(delta) = inner.delta.take() {
            for (id, wallet) in delta {
                inner.base.insert(id, wallet);
            }
            inner.cached_checksum = None;
            inner.cached_delta_checksum = None;
        }
    }

    /// Discard the overlay.
    pub fn revert(&self) {
        let mut inner = self.lock();
        if inner.delta.take().is_some() {
            inner.cached_delta_checksum = None;
        }
    }

    /// Drop every wallet, any overlay, and both memoized checksums.
    pub fn clear(&self) {
        *self.lock() = StateInner::default();
    }

    /// Number of wallets in the committed map.
    pub fn wallet_count(&self) -> usize {
        self.lock().base.len()
    }

    /// Whether a snapshot is currently active.
    pub fn snapshot_active(&self) -> bool {
        self.lock().delta.is_some()
    }

    /// Exact sum of all committed balances. The overlay is excluded.
    pub fn total_supply(&self) -> IxiAmount {
        let inner = self.lock();
        let mut total = IxiAmount::zero();
        for wallet in inner.base.values() {
            total += &wallet.balance;
        }
        total
    }

    /// The state checksum, binding every wallet in address order.
    ///
    /// Seeded with `SHA256("IXIAN-DLT")`, then folded per wallet as
    /// `SHA256(upperhex(h) || upperhex(wallet_checksum))` - hex string
    /// concatenation, a compatibility contract with deployed nodes that
    /// must be preserved bit for bit. With `from_snapshot` the overlay
    /// is merged over the base first.
    pub fn checksum(&self, from_snapshot: bool) -> Vec<u8> {
        let mut inner = self.lock();
        let overlay = from_snapshot && inner.delta.is_some();

        if overlay {
            if let Some(cached) = &inner.cached_delta_checksum {
                return cached.clone();
            }
        } else if let Some(cached) = &inner.cached_checksum {
            return cached.clone();
        }

        let digest = inner.fold_checksum(overlay);
        if overlay {
            inner.cached_delta_checksum = Some(digest.clone());
        } else {
            inner.cached_checksum = Some(digest.clone());
        }
        digest
    }

    /// Partition the committed map into chunks of `chunk_size` wallets
    /// for state sync.
    pub fn chunks(&self, chunk_size: usize, block_num: u64) -> Vec<WsChunk> {
        let inner = self.lock();
        let chunk_size = chunk_size.max(1);

        let mut chunks = Vec::new();
        let mut pending = Vec::with_capacity(chunk_size);
        for wallet in inner.base.values() {
            pending.push(wallet.clone());
            if pending.len() == chunk_size {
                let chunk_num = chunks.len() as i32;
                let wallets = std::mem::replace(&mut pending, Vec::with_capacity(chunk_size));
                chunks.push(WsChunk::new(block_num, chunk_num, wallets));
            }
        }
        if !pending.is_empty() {
            let chunk_num = chunks.len() as i32;
            chunks.push(WsChunk::new(block_num, chunk_num, pending));
        }
        chunks
    }

    /// Insert or overwrite committed wallets from a sync chunk.
    ///
    /// Refused while a snapshot is active: sync and speculative block
    /// execution must not interleave.
    pub fn apply_chunk(&self, wallets: &[Wallet]) -> Result<(), WalletStateError> {
        let mut inner = self.lock();
        if inner.delta.is_some() {
            warn!(
                wallets = wallets.len(),
                "chunk apply refused while a snapshot is active"
            );
            return Err(WalletStateError::SnapshotActive);
        }

        for wallet in wallets {
            inner.base.insert(wallet.id, wallet.clone());
        }
        inner.cached_checksum = None;
        inner.cached_delta_checksum = None;
        Ok(())
    }
}

impl Clone for WalletState {
    /// Deep copy: the base map, the memoized checksums, and the overlay
    /// iff one is active.
    fn clone(&self) -> Self {
        Self {
            inner: Mutex::new(self.lock().clone()),
        }
    }
}

impl StateInner {
    fn read_wallet(&self, id: &Address, from_snapshot: bool) -> Option<&Wallet> {
        if from_snapshot {
            if let Some(wallet) = self.delta.as_ref().and_then(|d| d.get(id)) {
                return Some(wallet);
            }
        }
        self.base.get(id)
    }

    fn write_wallet(&mut self, wallet: Wallet, to_snapshot: bool) {
        if to_snapshot {
            if let Some(delta) = self.delta.as_mut() {
                delta.insert(wallet.id, wallet);
                self.cached_delta_checksum = None;
                return;
            }
        }
        self.base.insert(wallet.id, wallet);
        self.cached_checksum = None;
        // The overlay checksum covers base ⊕ delta, so a base write
        // staled it as well.
        self.cached_delta_checksum = None;
    }

    fn fold_checksum(&self, overlay: bool) -> Vec<u8> {
        let mut digest = sha256(STATE_CHECKSUM_SEED).to_vec();
        match self.delta.as_ref().filter(|_| overlay) {
            Some(delta) => {
                let mut merged: BTreeMap<&Address, &Wallet> =
                    self.base.iter().map(|(id, w)| (id, w)).collect();
                for (id, wallet) in delta {
                    merged.insert(id, wallet);
                }
                for wallet in merged.values() {
                    digest = fold_step(&digest, &wallet.checksum());
                }
            }
            None => {
                for wallet in self.base.values() {
                    digest = fold_step(&digest, &wallet.checksum());
                }
            }
        }
        digest
    }
}

fn fold_step(acc: &[u8], wallet_checksum: &[u8]) -> Vec<u8> {
    let mut preimage = String::with_capacity(2 * (acc.len() + wallet_checksum.len()));
    preimage.push_str(&hex::encode_upper(acc));
    preimage.push_str(&hex::encode_upper(wallet_checksum));
    sha256(preimage.as_bytes()).to_vec()
}
