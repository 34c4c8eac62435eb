// Copyright (c) 2024 Botho Foundation

//! Tracing configuration for the node core.
//!
//! Installs a console subscriber; embedding applications that bring
//! their own subscriber simply skip this.

use anyhow::{anyhow, Result};

/// Initialize the tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {}", e))
}
