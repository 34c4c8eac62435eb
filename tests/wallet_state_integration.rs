// Copyright (c) 2024 Botho Foundation
//
//! Wallet State Integration Tests
//!
//! Exercises the state store across module boundaries and threads:
//! - Concurrent balance writes with interleaved checksum reads
//! - The speculative block-execution cycle (snapshot/commit/revert)
//! - Chunked export/import between two nodes
//! - Order independence of the state checksum

use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use ixian_core::address::ADDRESS_LEN;
use ixian_core::{Address, IxiAmount, WalletState};

fn addr(index: u32) -> Address {
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes[..4].copy_from_slice(&index.to_be_bytes());
    Address::new(bytes)
}

#[test]
fn concurrent_writers_converge_to_the_serial_state() {
    let state = Arc::new(WalletState::new());
    let writers = 4;
    let per_writer = 100u32;

    let mut handles = Vec::new();
    for writer in 0..writers {
        let state = state.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_writer {
                let index = writer * per_writer + i;
                state
                    .set_balance(&addr(index), IxiAmount::from_whole(index as u64 + 1), false, None)
                    .unwrap();
            }
        }));
    }

    // Checksum reads race the writers; each one must observe some
    // consistent interleaving without panicking or corrupting state.
    let reader = {
        let state = state.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                let _ = state.checksum(false);
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(state.wallet_count(), (writers * per_writer) as usize);

    let reference = WalletState::new();
    for index in 0..writers * per_writer {
        reference
            .set_balance(&addr(index), IxiAmount::from_whole(index as u64 + 1), false, None)
            .unwrap();
    }
    assert_eq!(state.checksum(false), reference.checksum(false));
    assert_eq!(state.total_supply(), reference.total_supply());
}

#[test]
fn speculative_block_cycle_commits_or_leaves_no_trace() {
    let state = WalletState::new();
    for index in 0..10 {
        state
            .set_balance(&addr(index), IxiAmount::from_whole(100), false, None)
            .unwrap();
    }
    let before = state.checksum(false);

    // A proposed block that gets discarded
    assert!(state.snapshot());
    state
        .set_balance(&addr(0), IxiAmount::from_whole(42), true, Some(1))
        .unwrap();
    state
        .set_balance(&addr(99), IxiAmount::from_whole(7), true, None)
        .unwrap();
    let speculative = state.checksum(true);
    assert_ne!(speculative, before);
    state.revert();

    assert_eq!(state.checksum(false), before);
    assert_eq!(state.get_balance(&addr(0), true), IxiAmount::from_whole(100));
    assert_eq!(state.wallet_count(), 10);

    // The same block accepted this time
    assert!(state.snapshot());
    state
        .set_balance(&addr(0), IxiAmount::from_whole(42), true, Some(1))
        .unwrap();
    state
        .set_balance(&addr(99), IxiAmount::from_whole(7), true, None)
        .unwrap();
    assert_eq!(state.checksum(true), speculative);
    state.commit();

    assert_eq!(state.checksum(false), speculative);
    assert_eq!(state.wallet_count(), 11);
}

#[test]
fn chunk_sync_reproduces_the_state_in_any_order() {
    let source = WalletState::new();
    for index in 0..100 {
        source
            .set_balance(
                &addr(index),
                IxiAmount::from_whole(index as u64),
                false,
                Some(index as u64),
            )
            .unwrap();
    }

    let mut chunks = source.chunks(7, 1_000);
    assert_eq!(chunks.len(), 15);

    // Chunks arrive from different peers in arbitrary order
    let mut rng = StdRng::seed_from_u64(1);
    chunks.shuffle(&mut rng);

    let target = WalletState::new();
    for chunk in &chunks {
        assert_eq!(chunk.block_num, 1_000);
        let bytes = chunk.to_bytes().unwrap();
        let received = ixian_core::WsChunk::from_bytes(&bytes).unwrap();
        target.apply_chunk(&received.wallets).unwrap();
    }

    assert_eq!(target.wallet_count(), source.wallet_count());
    assert_eq!(target.checksum(false), source.checksum(false));
    assert_eq!(target.total_supply(), source.total_supply());
}

#[test]
fn checksum_ignores_write_order() {
    let mut writes: Vec<u32> = (0..64).collect();
    let reference = WalletState::new();
    for index in &writes {
        reference
            .set_balance(&addr(*index), IxiAmount::from_whole(*index as u64), false, None)
            .unwrap();
    }
    let expected = reference.checksum(false);

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..5 {
        writes.shuffle(&mut rng);
        let state = WalletState::new();
        for index in &writes {
            state
                .set_balance(&addr(*index), IxiAmount::from_whole(*index as u64), false, None)
                .unwrap();
        }
        assert_eq!(state.checksum(false), expected);
    }
}
