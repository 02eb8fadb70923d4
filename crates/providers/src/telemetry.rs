// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber
///
/// `RUST_LOG` takes precedence over `default_filter` when it is set and valid.
///
/// # Errors
///
/// Returns an error if `default_filter` is needed but does not parse, or if a
/// global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
