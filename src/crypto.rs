// Copyright (c) 2024 Botho Foundation

//! Hash primitives: SHA-256 helpers and the Argon2id proof-of-work
//! function. The Argon2 parameters are fixed by consensus and must not
//! change.

use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Argon2id iteration count (t).
pub const ARGON2_TIME_COST: u32 = 1;

/// Argon2id memory in KiB (m).
pub const ARGON2_MEMORY_KIB: u32 = 1024;

/// Argon2id parallelism (p).
pub const ARGON2_LANES: u32 = 4;

/// Argon2id output length in bytes.
pub const ARGON2_OUTPUT_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("argon2 failure: {0}")]
    Argon2(String),
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Argon2id with the consensus mining parameters.
pub fn argon2id_hash(
    password: &[u8],
    salt: &[u8],
) -> Result<[u8; ARGON2_OUTPUT_LEN], CryptoError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_TIME_COST,
        ARGON2_LANES,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(password, salt, &mut out)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    Ok(out)
}
