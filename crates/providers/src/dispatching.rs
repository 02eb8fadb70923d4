// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prefix-dispatching data provider
//!
//! [`DispatchingDataProvider`] exposes the full [`DataProvider`] capability set
//! over several backends. Each experiment-scoped call is routed by the prefix of
//! its experiment id:
//!
//! - `prefix:local-id` goes to the provider registered under `prefix`, which
//!   receives `local-id`
//! - `local-id` (no colon) goes to the unprefixed provider, unchanged
//!
//! Only the experiment id is rewritten. Every other argument is forwarded as
//! given and every result, error included, is returned exactly as the backend
//! produced it. Run and tag names in results are not re-prefixed.

use std::sync::Arc;

use async_trait::async_trait;
use data_provider::{
    BlobSequenceDatum, BlobSequenceTimeSeries, DataProvider, ExperimentMetadata, ProviderResult,
    RequestContext, Run, RunTagFilter, RunTagMap, ScalarDatum, ScalarTimeSeries, TensorDatum,
    TensorTimeSeries,
};
use shared_types::ProviderPrefix;
use tracing::{debug, warn};

use crate::{
    blob::BlobResolver,
    config::DispatchConfig,
    registry::ProviderRegistry,
    resolver::{IdentifierResolver, Resolved},
};

const PROVIDER_NAME: &str = "dispatching";

/// Data provider that routes each call to a backend chosen by experiment id prefix
#[derive(Debug, Clone)]
pub struct DispatchingDataProvider {
    resolver: IdentifierResolver,
    blobs: BlobResolver,
}

impl DispatchingDataProvider {
    /// Create a dispatching provider with the default blob trial order
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_config(registry, &DispatchConfig::default())
    }

    /// Create a dispatching provider using settings from a [`DispatchConfig`]
    pub fn with_config(registry: ProviderRegistry, config: &DispatchConfig) -> Self {
        let registry = Arc::new(registry);
        Self {
            resolver: IdentifierResolver::new(Arc::clone(&registry)),
            blobs: BlobResolver::with_fallback_position(registry, config.blob_fallback_position),
        }
    }

    /// The registry calls are routed through
    pub fn registry(&self) -> &ProviderRegistry {
        self.resolver.registry()
    }

    /// The resolver used for experiment ids
    pub fn resolver(&self) -> &IdentifierResolver {
        &self.resolver
    }

    /// The resolver used for blob keys
    pub fn blob_resolver(&self) -> &BlobResolver {
        &self.blobs
    }

    fn route<'a>(&'a self, operation: &str, experiment_id: &'a str) -> ProviderResult<Resolved<'a>> {
        match self.resolver.resolve(experiment_id) {
            Ok(resolved) => {
                debug!(
                    "Routing {} for experiment {} to provider {} (prefix: {}, local id: {})",
                    operation,
                    experiment_id,
                    resolved.provider.name(),
                    resolved.prefix.map_or("<unprefixed>", ProviderPrefix::as_str),
                    resolved.local_id
                );
                Ok(resolved)
            }
            Err(e) => {
                warn!("Cannot route {}: {}", operation, e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl DataProvider for DispatchingDataProvider {
    async fn experiment_metadata(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<ExperimentMetadata> {
        let target = self.route("experiment_metadata", experiment_id)?;
        target
            .provider
            .experiment_metadata(ctx, target.local_id)
            .await
    }

    async fn list_plugins(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<Vec<String>> {
        let target = self.route("list_plugins", experiment_id)?;
        target.provider.list_plugins(ctx, target.local_id).await
    }

    async fn list_runs(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<Vec<Run>> {
        let target = self.route("list_runs", experiment_id)?;
        target.provider.list_runs(ctx, target.local_id).await
    }

    async fn list_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarTimeSeries>> {
        let target = self.route("list_scalars", experiment_id)?;
        target
            .provider
            .list_scalars(ctx, target.local_id, plugin_name, run_tag_filter)
            .await
    }

    async fn read_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<ScalarDatum>>> {
        let target = self.route("read_scalars", experiment_id)?;
        target
            .provider
            .read_scalars(ctx, target.local_id, plugin_name, downsample, run_tag_filter)
            .await
    }

    async fn read_last_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarDatum>> {
        let target = self.route("read_last_scalars", experiment_id)?;
        target
            .provider
            .read_last_scalars(ctx, target.local_id, plugin_name, run_tag_filter)
            .await
    }

    async fn list_tensors(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<TensorTimeSeries>> {
        let target = self.route("list_tensors", experiment_id)?;
        target
            .provider
            .list_tensors(ctx, target.local_id, plugin_name, run_tag_filter)
            .await
    }

    async fn read_tensors(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<TensorDatum>>> {
        let target = self.route("read_tensors", experiment_id)?;
        target
            .provider
            .read_tensors(ctx, target.local_id, plugin_name, downsample, run_tag_filter)
            .await
    }

    async fn list_blob_sequences(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<BlobSequenceTimeSeries>> {
        let target = self.route("list_blob_sequences", experiment_id)?;
        target
            .provider
            .list_blob_sequences(ctx, target.local_id, plugin_name, run_tag_filter)
            .await
    }

    async fn read_blob_sequences(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<BlobSequenceDatum>>> {
        let target = self.route("read_blob_sequences", experiment_id)?;
        target
            .provider
            .read_blob_sequences(ctx, target.local_id, plugin_name, downsample, run_tag_filter)
            .await
    }

    async fn read_blob(&self, ctx: &RequestContext, blob_key: &str) -> ProviderResult<Vec<u8>> {
        self.blobs.read_blob(ctx, blob_key).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use data_provider::{ErrorKind, ExperimentMetadata};

    use super::*;
    use crate::{blob::FallbackPosition, memory::MemoryDataProvider};

    fn memory(name: &str, experiments: &[&str]) -> Arc<MemoryDataProvider> {
        let provider = MemoryDataProvider::new(name);
        for id in experiments {
            provider
                .create_experiment(*id, ExperimentMetadata::at_location(format!("{name}://{id}")))
                .unwrap();
        }
        Arc::new(provider)
    }

    #[tokio::test]
    async fn routes_metadata_by_prefix() {
        let registry = ProviderRegistry::builder()
            .register("foo", memory("foo", &["123"]))
            .unwrap()
            .unprefixed(memory("baz", &["baz"]))
            .unwrap()
            .build();
        let dispatcher = DispatchingDataProvider::new(registry);
        let ctx = RequestContext::new();

        let metadata = dispatcher
            .experiment_metadata(&ctx, "foo:123")
            .await
            .unwrap();
        assert_eq!(metadata.data_location, "foo://123");

        let metadata = dispatcher.experiment_metadata(&ctx, "baz").await.unwrap();
        assert_eq!(metadata.data_location, "baz://baz");
    }

    #[tokio::test]
    async fn backend_errors_pass_through() {
        let registry = ProviderRegistry::builder()
            .register("foo", memory("foo", &["123"]))
            .unwrap()
            .build();
        let dispatcher = DispatchingDataProvider::new(registry);
        let ctx = RequestContext::new();

        let direct = memory("foo", &["123"])
            .experiment_metadata(&ctx, "999")
            .await
            .unwrap_err();
        let routed = dispatcher
            .experiment_metadata(&ctx, "foo:999")
            .await
            .unwrap_err();
        assert_eq!(routed.kind(), direct.kind());
        assert_eq!(routed.to_string(), direct.to_string());
    }

    #[tokio::test]
    async fn routing_errors_are_not_found() {
        let dispatcher = DispatchingDataProvider::new(ProviderRegistry::builder().build());
        let ctx = RequestContext::new();

        let err = dispatcher.list_runs(&ctx, "quux:hmm").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("'quux:hmm'"));

        let err = dispatcher.list_plugins(&ctx, "baz").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("'baz'"));
    }

    #[test]
    fn config_sets_blob_order() {
        let config = DispatchConfig {
            blob_fallback_position: FallbackPosition::First,
            ..DispatchConfig::default()
        };
        let dispatcher =
            DispatchingDataProvider::with_config(ProviderRegistry::builder().build(), &config);
        assert_eq!(
            dispatcher.blob_resolver().fallback_position(),
            FallbackPosition::First
        );
        assert_eq!(dispatcher.name(), "dispatching");
        assert!(dispatcher.registry().is_empty());
    }
}
