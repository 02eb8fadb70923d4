// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Experiment identifier resolution
//!
//! Turns an incoming experiment id into the backend that owns it plus the id
//! that backend understands. Resolution is a pure lookup against the immutable
//! registry; it never calls a backend.

use std::sync::Arc;

use data_provider::{DataProvider, ProviderError};
use shared_types::{ExperimentId, ProviderPrefix};

use crate::registry::ProviderRegistry;

/// Routing failures raised by the dispatching layer itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    /// The identifier names a prefix that is not registered
    #[error("Unknown prefix '{prefix}' in experiment ID: '{experiment_id}'")]
    UnknownPrefix {
        prefix: String,
        experiment_id: String,
    },

    /// The identifier has no prefix and no unprefixed provider exists
    #[error("No data provider found for unprefixed experiment ID: '{experiment_id}'")]
    Unprefixed { experiment_id: String },

    /// No candidate provider recognized a blob key
    #[error("No data provider recognized blob key: '{blob_key}'")]
    UnknownBlobKey { blob_key: String },
}

impl From<ResolveError> for ProviderError {
    fn from(error: ResolveError) -> Self {
        ProviderError::not_found(error)
    }
}

/// A backend selected for one call
#[derive(Clone, Copy)]
pub struct Resolved<'a> {
    /// The provider that owns the experiment
    pub provider: &'a Arc<dyn DataProvider>,
    /// The matched prefix, `None` when the unprefixed provider was chosen
    pub prefix: Option<&'a ProviderPrefix>,
    /// The experiment id with the prefix and separator removed
    pub local_id: &'a str,
}

impl std::fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("provider", &self.provider.name())
            .field("prefix", &self.prefix.map(ProviderPrefix::as_str))
            .field("local_id", &self.local_id)
            .finish()
    }
}

/// Maps experiment ids to providers using a shared registry
#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    registry: Arc<ProviderRegistry>,
}

impl IdentifierResolver {
    /// Create a resolver over a registry
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this resolver consults
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Resolve an experiment id to its provider and local id
    ///
    /// The id is split on its first colon. A prefixed id whose prefix is not
    /// registered fails even when an unprefixed provider exists; the local id is
    /// passed on verbatim, empty or not.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownPrefix`] or [`ResolveError::Unprefixed`].
    pub fn resolve<'a>(&'a self, experiment_id: &'a str) -> Result<Resolved<'a>, ResolveError> {
        let parsed = ExperimentId::parse(experiment_id);
        match parsed.prefix() {
            Some(prefix) => {
                let (prefix, provider) = self
                    .registry
                    .get_entry(prefix)
                    .ok_or_else(|| ResolveError::UnknownPrefix {
                        prefix: prefix.to_string(),
                        experiment_id: experiment_id.to_string(),
                    })?;
                Ok(Resolved {
                    provider,
                    prefix: Some(prefix),
                    local_id: parsed.local_id(),
                })
            }
            None => {
                let provider =
                    self.registry
                        .unprefixed()
                        .ok_or_else(|| ResolveError::Unprefixed {
                            experiment_id: experiment_id.to_string(),
                        })?;
                Ok(Resolved {
                    provider,
                    prefix: None,
                    local_id: experiment_id,
                })
            }
        }
    }
}
