// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider registry for prefix-based dispatch
//!
//! The registry maps prefix tokens to backend providers and optionally holds a
//! single provider for unprefixed experiment ids. It is assembled once with
//! [`ProviderRegistryBuilder`] and never changes afterwards, so it can be shared
//! across concurrent callers behind an `Arc` without any locking.

use std::{collections::BTreeMap, fmt, sync::Arc};

use data_provider::DataProvider;
use shared_types::{PrefixError, ProviderPrefix};
use tracing::{debug, info};

/// Error type for registry construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum RegistryError {
    /// A prefix token failed validation
    #[error("Invalid provider prefix: {0}")]
    InvalidPrefix(#[from] PrefixError),

    /// Two providers were registered under the same prefix
    #[error("A provider is already registered for prefix '{prefix}'")]
    DuplicatePrefix { prefix: String },

    /// More than one unprefixed provider was supplied
    #[error("An unprefixed provider is already registered")]
    DuplicateUnprefixed,
}

/// Immutable mapping from prefix to data provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderPrefix, Arc<dyn DataProvider>>,
    unprefixed: Option<Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    /// Start building a registry
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Build a registry from `(prefix, provider)` pairs and an optional unprefixed provider
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if a prefix is invalid or repeated.
    pub fn from_providers<I, S>(
        providers: I,
        unprefixed: Option<Arc<dyn DataProvider>>,
    ) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, Arc<dyn DataProvider>)>,
        S: Into<String>,
    {
        let mut builder = providers
            .into_iter()
            .try_fold(Self::builder(), |builder, (prefix, provider)| {
                builder.register(prefix, provider)
            })?;
        if let Some(provider) = unprefixed {
            builder = builder.unprefixed(provider)?;
        }
        Ok(builder.build())
    }

    /// Look up the provider registered for an exact prefix
    pub fn get(&self, prefix: &str) -> Option<&Arc<dyn DataProvider>> {
        self.providers.get(prefix)
    }

    /// Look up a prefix, returning the registered token alongside its provider
    pub fn get_entry(&self, prefix: &str) -> Option<(&ProviderPrefix, &Arc<dyn DataProvider>)> {
        self.providers.get_key_value(prefix)
    }

    /// Get the provider for unprefixed experiment ids, if any
    pub fn unprefixed(&self) -> Option<&Arc<dyn DataProvider>> {
        self.unprefixed.as_ref()
    }

    /// Iterate over registered prefixes and providers in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&ProviderPrefix, &Arc<dyn DataProvider>)> {
        self.providers.iter()
    }

    /// Get the registered prefixes in order
    pub fn prefixes(&self) -> impl Iterator<Item = &ProviderPrefix> {
        self.providers.keys()
    }

    /// Whether a provider is registered for the prefix
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.providers.contains_key(prefix)
    }

    /// Get the number of registered providers, counting the unprefixed one
    pub fn provider_count(&self) -> usize {
        self.providers.len() + usize::from(self.unprefixed.is_some())
    }

    /// Whether the registry has no providers at all
    pub fn is_empty(&self) -> bool {
        self.provider_count() == 0
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|(prefix, provider)| (prefix.as_str(), provider.name()))
                    .collect::<BTreeMap<_, _>>(),
            )
            .field(
                "unprefixed",
                &self.unprefixed.as_ref().map(|provider| provider.name()),
            )
            .finish()
    }
}

/// Builder for [`ProviderRegistry`]
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: BTreeMap<ProviderPrefix, Arc<dyn DataProvider>>,
    unprefixed: Option<Arc<dyn DataProvider>>,
}

impl ProviderRegistryBuilder {
    /// Register a provider under a prefix
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPrefix`] if the prefix is empty or
    /// contains `:`, and [`RegistryError::DuplicatePrefix`] if the prefix is
    /// already taken.
    pub fn register(
        mut self,
        prefix: impl Into<String>,
        provider: Arc<dyn DataProvider>,
    ) -> Result<Self, RegistryError> {
        let prefix = ProviderPrefix::new(prefix)?;
        if self.providers.contains_key(&prefix) {
            return Err(RegistryError::DuplicatePrefix {
                prefix: prefix.to_string(),
            });
        }
        debug!("Registering provider {} under prefix '{}'", provider.name(), prefix);
        self.providers.insert(prefix, provider);
        Ok(self)
    }

    /// Set the provider for experiment ids without a prefix
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateUnprefixed`] if one was already set.
    pub fn unprefixed(mut self, provider: Arc<dyn DataProvider>) -> Result<Self, RegistryError> {
        if self.unprefixed.is_some() {
            return Err(RegistryError::DuplicateUnprefixed);
        }
        debug!("Registering provider {} for unprefixed ids", provider.name());
        self.unprefixed = Some(provider);
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> ProviderRegistry {
        info!(
            "Provider registry built with {} prefixed provider(s), unprefixed provider {}",
            self.providers.len(),
            if self.unprefixed.is_some() {
                "present"
            } else {
                "absent"
            }
        );
        ProviderRegistry {
            providers: self.providers,
            unprefixed: self.unprefixed,
        }
    }
}

impl fmt::Debug for ProviderRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistryBuilder")
            .field(
                "prefixes",
                &self.providers.keys().map(ProviderPrefix::as_str).collect::<Vec<_>>(),
            )
            .field("unprefixed", &self.unprefixed.is_some())
            .finish()
    }
}
