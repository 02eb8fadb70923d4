// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blob key resolution by ordered trial delegation
//!
//! Blob keys carry no experiment id and no prefix: only the backend that minted
//! a key can recognize it. The [`BlobResolver`] therefore offers the key to each
//! registered provider in turn and returns the first successful read.
//!
//! A candidate answering `NotFound` did not recognize the key and the trial
//! moves on. Any other failure means the key was recognized but could not be
//! served, and is returned immediately.

use std::{fmt, sync::Arc};

use data_provider::{DataProvider, ProviderResult, RequestContext};
use serde::{Deserialize, Serialize};
use shared_types::ProviderPrefix;
use tracing::{debug, trace, warn};

use crate::{registry::ProviderRegistry, resolver::ResolveError};

/// Where the unprefixed provider sits in the blob trial order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPosition {
    /// Try the unprefixed provider before any prefixed one
    First,
    /// Try the unprefixed provider after every prefixed one
    #[default]
    Last,
}

impl fmt::Display for FallbackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPosition::First => write!(f, "first"),
            FallbackPosition::Last => write!(f, "last"),
        }
    }
}

/// One provider in the trial order
#[derive(Clone, Copy)]
pub struct BlobCandidate<'a> {
    /// Registered prefix, `None` for the unprefixed provider
    pub prefix: Option<&'a ProviderPrefix>,
    /// The provider to try
    pub provider: &'a Arc<dyn DataProvider>,
}

impl fmt::Debug for BlobCandidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobCandidate")
            .field("prefix", &self.prefix.map(ProviderPrefix::as_str))
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Reads blobs by probing registered providers in a fixed order
#[derive(Debug, Clone)]
pub struct BlobResolver {
    registry: Arc<ProviderRegistry>,
    fallback_position: FallbackPosition,
}

impl BlobResolver {
    /// Create a resolver probing the unprefixed provider last
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self::with_fallback_position(registry, FallbackPosition::default())
    }

    /// Create a resolver with an explicit position for the unprefixed provider
    pub fn with_fallback_position(
        registry: Arc<ProviderRegistry>,
        fallback_position: FallbackPosition,
    ) -> Self {
        Self {
            registry,
            fallback_position,
        }
    }

    /// Position of the unprefixed provider in the trial order
    pub fn fallback_position(&self) -> FallbackPosition {
        self.fallback_position
    }

    /// The trial order: registered prefixes lexicographically, with the
    /// unprefixed provider first or last
    pub fn candidates(&self) -> Vec<BlobCandidate<'_>> {
        let prefixed = self
            .registry
            .iter()
            .map(|(prefix, provider)| BlobCandidate {
                prefix: Some(prefix),
                provider,
            });
        let fallback = self
            .registry
            .unprefixed()
            .map(|provider| BlobCandidate {
                prefix: None,
                provider,
            });

        match self.fallback_position {
            FallbackPosition::First => fallback.into_iter().chain(prefixed).collect(),
            FallbackPosition::Last => prefixed.chain(fallback).collect(),
        }
    }

    /// Read a blob from the first provider that recognizes the key
    ///
    /// Candidates are tried one at a time; at most one read succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first non-`NotFound` error from a candidate unchanged, or
    /// `NotFound` naming the key when no candidate recognized it.
    pub async fn read_blob(&self, ctx: &RequestContext, blob_key: &str) -> ProviderResult<Vec<u8>> {
        for candidate in self.candidates() {
            let label = candidate.prefix.map_or("<unprefixed>", ProviderPrefix::as_str);
            trace!(
                "Offering blob key to provider {} ({})",
                candidate.provider.name(),
                label
            );
            match candidate.provider.read_blob(ctx, blob_key).await {
                Ok(blob) => {
                    debug!(
                        "Blob resolved by provider {} ({}), {} bytes",
                        candidate.provider.name(),
                        label,
                        blob.len()
                    );
                    return Ok(blob);
                }
                Err(e) if e.is_not_found() => {
                    trace!(
                        "Provider {} ({}) did not recognize blob key: {}",
                        candidate.provider.name(),
                        label,
                        e
                    );
                }
                Err(e) => {
                    debug!(
                        "Provider {} ({}) recognized blob key but failed: {}",
                        candidate.provider.name(),
                        label,
                        e
                    );
                    return Err(e);
                }
            }
        }

        warn!("No provider recognized blob key {}", blob_key);
        Err(ResolveError::UnknownBlobKey {
            blob_key: blob_key.to_string(),
        }
        .into())
    }
}
