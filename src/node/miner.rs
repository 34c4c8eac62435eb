use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{BlockProcessorView, ChainView, KeyStore, ProtocolCode, ProtocolSink};
use crate::address::Address;
use crate::block::Block;
use crate::config::Config;
use crate::crypto;
use crate::transaction::Transaction;

/// Lowest accepted difficulty; lower values are clamped up.
pub const MIN_DIFFICULTY: u64 = 14;

/// Highest expressible difficulty: a 32-byte hash has 256 bits.
pub const MAX_DIFFICULTY: u64 = 256;

/// Length of a mining nonce in characters.
pub const NONCE_LEN: usize = 128;

/// Nonce characters. Part of the wire contract.
const NONCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The miner stays idle until the chain has this many blocks.
const MIN_CHAIN_HEIGHT: u64 = 10;

const IDLE_SLEEP: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinerError {
    #[error("mining is disabled by configuration")]
    Disabled,

    #[error("miner is already running")]
    AlreadyRunning,
}

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MinerStats {
    pub total_hashes: u64,
    pub solutions_found: u64,
    pub start_time: Instant,
}

impl MinerStats {
    pub fn hashrate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_hashes as f64 / elapsed
        } else {
            0.0
        }
    }
}

enum MinerState {
    Idle,
    Searching,
    Solving,
}

/// The proof-of-work mining loop.
///
/// One OS thread polls the chain for the most recent unsealed block
/// inside the redacted window and searches Argon2id pre-images of
/// `block_checksum || solver_address` (salted with a fresh random nonce
/// per attempt) until one clears the block's difficulty mask. Solutions
/// leave the node as proof-of-work transactions through the protocol
/// sink.
pub struct Miner {
    chain: Arc<dyn ChainView>,
    processor: Arc<dyn BlockProcessorView>,
    protocol: Arc<dyn ProtocolSink>,
    keys: Arc<dyn KeyStore>,
    enabled: bool,
    redacted_window_size: u64,
    status_interval: Duration,
    shutdown: Arc<AtomicBool>,
    window_attempts: Arc<AtomicU64>,
    total_attempts: Arc<AtomicU64>,
    solutions_found: Arc<AtomicU64>,
    start_time: Instant,
    handle: Option<JoinHandle<()>>,
}

impl Miner {
    pub fn new(
        chain: Arc<dyn ChainView>,
        processor: Arc<dyn BlockProcessorView>,
        protocol: Arc<dyn ProtocolSink>,
        keys: Arc<dyn KeyStore>,
        config: &Config,
    ) -> Self {
        Self {
            chain,
            processor,
            protocol,
            keys,
            enabled: config.mining.enabled,
            redacted_window_size: config.redacted_window_size,
            status_interval: Duration::from_secs(config.mining.status_interval_secs.max(1)),
            shutdown: Arc::new(AtomicBool::new(false)),
            window_attempts: Arc::new(AtomicU64::new(0)),
            total_attempts: Arc::new(AtomicU64::new(0)),
            solutions_found: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
            handle: None,
        }
    }

    /// Spawn the mining thread.
    pub fn start(&mut self) -> Result<(), MinerError> {
        if !self.enabled {
            warn!("mining is disabled by configuration");
            return Err(MinerError::Disabled);
        }
        if self.handle.is_some() {
            return Err(MinerError::AlreadyRunning);
        }

        self.shutdown.store(false, Ordering::SeqCst);
        let chain = self.chain.clone();
        let processor = self.processor.clone();
        let protocol = self.protocol.clone();
        let keys = self.keys.clone();
        let shutdown = self.shutdown.clone();
        let window_attempts = self.window_attempts.clone();
        let total_attempts = self.total_attempts.clone();
        let solutions_found = self.solutions_found.clone();
        let redacted_window_size = self.redacted_window_size;
        let status_interval = self.status_interval;

        self.handle = Some(thread::spawn(move || {
            mine_loop(
                chain,
                processor,
                protocol,
                keys,
                shutdown,
                window_attempts,
                total_attempts,
                solutions_found,
                redacted_window_size,
                status_interval,
            );
        }));
        info!("miner started");
        Ok(())
    }

    /// Signal the mining thread to stop and wait for it. Returns after
    /// at most one in-flight hash completes.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("miner stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stats(&self) -> MinerStats {
        MinerStats {
            total_hashes: self.total_attempts.load(Ordering::Relaxed),
            solutions_found: self.solutions_found.load(Ordering::Relaxed),
            start_time: self.start_time,
        }
    }
}

/// The actual mining loop
#[allow(clippy::too_many_arguments)]
fn mine_loop(
    chain: Arc<dyn ChainView>,
    processor: Arc<dyn BlockProcessorView>,
    protocol: Arc<dyn ProtocolSink>,
    keys: Arc<dyn KeyStore>,
    shutdown: Arc<AtomicBool>,
    window_attempts: Arc<AtomicU64>,
    total_attempts: Arc<AtomicU64>,
    solutions_found: Arc<AtomicU64>,
    redacted_window_size: u64,
    status_interval: Duration,
) {
    let mut rng = StdRng::from_entropy();
    let mut state = MinerState::Idle;
    let mut active_block: Option<Block> = None;
    let mut challenge: Vec<u8> = Vec::new();
    let mut difficulty = MIN_DIFFICULTY;
    let mut solved: HashSet<u64> = HashSet::new();
    let mut last_status = Instant::now();
    let solver = keys.wallet_address();

    while !shutdown.load(Ordering::Relaxed) {
        if last_status.elapsed() >= status_interval {
            let attempts = window_attempts.swap(0, Ordering::Relaxed);
            if attempts > 0 {
                let rate = attempts as f64 / last_status.elapsed().as_secs_f64();
                info!(hashes_per_sec = rate as u64, "mining");
            }
            last_status = Instant::now();
        }

        match state {
            MinerState::Idle => {
                if processor.is_operating() && chain.last_block_num() >= MIN_CHAIN_HEIGHT {
                    state = MinerState::Searching;
                } else {
                    thread::sleep(IDLE_SLEEP);
                }
            }
            MinerState::Searching => {
                let oldest = chain.last_block_num().saturating_sub(redacted_window_size);
                solved.retain(|num| *num > oldest);

                match scan_unsealed(chain.as_ref(), redacted_window_size, &solved) {
                    Some(block) => {
                        difficulty = block.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
                        challenge = solving_challenge(&block, &solver);
                        debug!(
                            block_num = block.block_num,
                            difficulty, "solving unsealed block"
                        );
                        active_block = Some(block);
                        state = MinerState::Solving;
                    }
                    None => {
                        state = MinerState::Idle;
                        thread::sleep(IDLE_SLEEP);
                    }
                }
            }
            MinerState::Solving => {
                let Some(block) = active_block.as_ref() else {
                    state = MinerState::Searching;
                    continue;
                };

                // Drop the block if a peer sealed it first or it left
                // the window.
                match chain.get_block(block.block_num) {
                    Some(current) if !current.is_sealed() => {}
                    _ => {
                        debug!(
                            block_num = block.block_num,
                            "active block sealed elsewhere or pruned, rescanning"
                        );
                        active_block = None;
                        state = MinerState::Searching;
                        continue;
                    }
                }

                let nonce = random_nonce(&mut rng);
                let hash = match crypto::argon2id_hash(&challenge, nonce.as_bytes()) {
                    Ok(hash) => hash,
                    Err(e) => {
                        error!(error = %e, "argon2 primitive failed, stopping miner");
                        break;
                    }
                };
                window_attempts.fetch_add(1, Ordering::Relaxed);
                total_attempts.fetch_add(1, Ordering::Relaxed);

                if validate_hash(&hex::encode_upper(hash), difficulty) {
                    info!(
                        block_num = block.block_num,
                        difficulty, "found proof-of-work solution"
                    );
                    broadcast_solution(
                        protocol.as_ref(),
                        keys.as_ref(),
                        block.block_num,
                        &nonce,
                    );
                    // Remember the block locally so the next search does
                    // not pick it up again before the chain view catches
                    // up with our own solution.
                    solved.insert(block.block_num);
                    solutions_found.fetch_add(1, Ordering::Relaxed);
                    active_block = None;
                    state = MinerState::Idle;
                }
            }
        }
    }
}

fn broadcast_solution(protocol: &dyn ProtocolSink, keys: &dyn KeyStore, block_num: u64, nonce: &str) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut tx = Transaction::pow_solution(
        keys.wallet_address(),
        &keys.public_key(),
        block_num,
        nonce,
        timestamp,
    );
    tx.signature = keys.sign(&tx.checksum);

    match tx.to_bytes() {
        Ok(bytes) => {
            protocol.broadcast(ProtocolCode::TransactionData, &bytes);
            info!(block_num, tx_id = %tx.id, "broadcast proof-of-work solution");
        }
        Err(e) => error!(error = %e, "failed to serialize proof-of-work solution"),
    }
}

/// The Argon2id password for a block: uppercase hex of the block
/// checksum concatenated with the solver address string.
fn solving_challenge(block: &Block, solver: &Address) -> Vec<u8> {
    format!("{}{}", hex::encode_upper(&block.block_checksum), solver).into_bytes()
}

fn random_nonce(rng: &mut StdRng) -> String {
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

fn scan_unsealed(
    chain: &dyn ChainView,
    redacted_window_size: u64,
    skip: &HashSet<u64>,
) -> Option<Block> {
    let last = chain.last_block_num();
    let oldest = last.saturating_sub(redacted_window_size);

    let mut num = last;
    while num > oldest {
        if !skip.contains(&num) {
            if let Some(block) = chain.get_block(num) {
                if !block.is_sealed() {
                    return Some(block);
                }
            }
        }
        num -= 1;
    }
    None
}

/// Find the most recent unsealed block within the redacted window, the
/// block a miner would pick next.
pub fn find_unsealed_block(chain: &dyn ChainView, redacted_window_size: u64) -> Option<Block> {
    scan_unsealed(chain, redacted_window_size, &HashSet::new())
}

/// The difficulty bitmask: one set bit per required leading zero bit of
/// the hash, MSB first.
pub fn difficulty_mask(difficulty: u64) -> Vec<u8> {
    let difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let mut mask = vec![0xFFu8; (difficulty / 8) as usize];
    let rem = (difficulty % 8) as u32;
    if rem != 0 {
        mask.push(0xFFu8 << (8 - rem));
    }
    mask
}

/// Check an uppercase-hex hash against a difficulty. The difficulty is
/// clamped to `[14, 256]` and threaded as a parameter so concurrent
/// verifications never share state.
pub fn validate_hash(hash_hex: &str, difficulty: u64) -> bool {
    let Ok(hash) = hex::decode(hash_hex) else {
        return false;
    };
    let mask = difficulty_mask(difficulty);
    if hash.len() < mask.len() {
        return false;
    }
    mask.iter().zip(hash.iter()).all(|(m, b)| b & m == 0)
}

/// Recompute and check a claimed solution. Usable by block validators
/// without a miner instance; a missing block fails the check.
pub fn verify_nonce(
    chain: &dyn ChainView,
    nonce: &str,
    block_num: u64,
    solver: &Address,
    difficulty: u64,
) -> bool {
    let Some(block) = chain.get_block(block_num) else {
        return false;
    };
    let challenge = solving_challenge(&block, solver);
    match crypto::argon2id_hash(&challenge, nonce.as_bytes()) {
        Ok(hash) => validate_hash(&hex::encode_upper(hash), difficulty),
        Err(e) => {
            warn!(error = %e, "argon2 failure during nonce verification");
            false
        }
    }
}
