// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Dispatcher configuration
//!
//! Settings are layered with the `config` crate, later sources overriding
//! earlier ones:
//!
//! 1. Default values
//! 2. A configuration file (`dispatch.{json,toml,yaml}` in the working
//!    directory, or an explicit path)
//! 3. Environment variables with the `DISPATCH_` prefix, e.g.
//!    `DISPATCH_BLOB_FALLBACK_POSITION=first`

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::{blob::FallbackPosition, telemetry::init_tracing};

const ENV_PREFIX: &str = "DISPATCH";
const DEFAULT_FILE: &str = "dispatch";
const DEFAULT_LOG_FILTER: &str = "info";

/// Settings for a [`DispatchingDataProvider`](crate::DispatchingDataProvider)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Where the unprefixed provider sits in the blob trial order
    pub blob_fallback_position: FallbackPosition,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            blob_fallback_position: FallbackPosition::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DispatchConfig {
    /// Load configuration from the optional `dispatch.*` file and the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file when given
    ///
    /// An explicit path must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value is invalid.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn build(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        let config = Config::builder()
            .set_default(
                "blob_fallback_position",
                FallbackPosition::default().to_string(),
            )?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .add_source(file)
            .add_source(environment.prefix_separator("_").separator("__"))
            .build()?;

        let dispatch_config: Self = config.try_deserialize()?;
        dispatch_config.validate()?;
        Ok(dispatch_config)
    }

    /// Check values that deserialization alone does not
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` if the log filter does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|e| {
            ConfigError::Message(format!("invalid log filter '{}': {e}", self.log_filter))
        })?;
        Ok(())
    }

    /// Install the global tracing subscriber using [`Self::log_filter`]
    ///
    /// ```rust,no_run
    /// use providers::DispatchConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = DispatchConfig::load()?;
    /// config.init_tracing()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// See [`init_tracing`].
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        init_tracing(&self.log_filter)
    }
}
