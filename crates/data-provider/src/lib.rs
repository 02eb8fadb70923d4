// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Data provider contract for experiment data
//!
//! This crate defines the capability set every experiment data backend
//! implements, along with the values it returns and the errors it may raise.
//!
//! # Core Abstractions
//!
//! - **`DataProvider` Trait**: metadata, listing, reading and blob retrieval for one data source
//! - **Request Context**: [`RequestContext`], an opaque per-request token passed to every call
//! - **Error Handling**: [`ProviderError`] with a backend-agnostic [`ErrorKind`]
//! - **Data Types**: time series summaries, data points and blob references
//!
//! # Key Features
//!
//! - **Object Safe**: providers are shared as `Arc<dyn DataProvider>`, so a set of
//!   heterogeneous backends can sit behind one interface
//! - **Async-First Design**: every operation is an `async fn`
//! - **Opaque Payloads**: run/tag names, steps and blob keys belong to the backend

use async_trait::async_trait;

pub mod context;
pub mod error;
pub mod types;

pub use context::RequestContext;
pub use error::{ErrorKind, ProviderError, ProviderResult};
pub use types::*;

/// Read access to experiment data held by one backend
///
/// Every operation except [`DataProvider::read_blob`] is scoped to an
/// experiment id whose meaning is defined by the implementing backend.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Get metadata for an experiment
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the experiment does not exist
    async fn experiment_metadata(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<ExperimentMetadata>;

    /// List the plugins that have data in an experiment
    async fn list_plugins(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<Vec<String>>;

    /// List the runs of an experiment
    async fn list_runs(&self, ctx: &RequestContext, experiment_id: &str)
    -> ProviderResult<Vec<Run>>;

    /// List scalar series owned by a plugin
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Experiment to query
    /// * `plugin_name` - Only series written by this plugin are returned
    /// * `run_tag_filter` - Optional run/tag restriction; `None` means no filter
    async fn list_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarTimeSeries>>;

    /// Read scalar points owned by a plugin
    ///
    /// `downsample` caps the number of points per series; `None` returns all
    /// points. The downsampling strategy is up to the backend.
    async fn read_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<ScalarDatum>>>;

    /// Read the most recent scalar point of each series owned by a plugin
    ///
    /// The default implementation reads every point and keeps the last one;
    /// backends with an index should override it.
    async fn read_last_scalars(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarDatum>> {
        let reading = self
            .read_scalars(ctx, experiment_id, plugin_name, None, run_tag_filter)
            .await?;
        Ok(reading
            .into_iter()
            .map(|(run, tags)| {
                let last = tags
                    .into_iter()
                    .filter_map(|(tag, points)| points.last().map(|datum| (tag, *datum)))
                    .collect();
                (run, last)
            })
            .collect())
    }

    /// List tensor series owned by a plugin
    async fn list_tensors(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<TensorTimeSeries>>;

    /// Read tensor points owned by a plugin
    async fn read_tensors(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<TensorDatum>>>;

    /// List blob-sequence series owned by a plugin
    async fn list_blob_sequences(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<BlobSequenceTimeSeries>>;

    /// Read blob-sequence points owned by a plugin
    async fn read_blob_sequences(
        &self,
        ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<BlobSequenceDatum>>>;

    /// Fetch the contents of a blob by key
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if this provider does not recognize
    /// the key. Other error kinds mean the key was recognized but could not be
    /// served.
    async fn read_blob(&self, ctx: &RequestContext, blob_key: &str) -> ProviderResult<Vec<u8>>;

    /// Get the name of this provider, used in logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that only implements scalar reads, to exercise the defaults
    struct ScalarsOnly;

    #[async_trait]
    impl DataProvider for ScalarsOnly {
        async fn experiment_metadata(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
        ) -> ProviderResult<ExperimentMetadata> {
            Err(ProviderError::unimplemented("experiment_metadata"))
        }

        async fn list_plugins(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
        ) -> ProviderResult<Vec<String>> {
            Err(ProviderError::unimplemented("list_plugins"))
        }

        async fn list_runs(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
        ) -> ProviderResult<Vec<Run>> {
            Err(ProviderError::unimplemented("list_runs"))
        }

        async fn list_scalars(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
            _plugin_name: &str,
            _run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<ScalarTimeSeries>> {
            Err(ProviderError::unimplemented("list_scalars"))
        }

        async fn read_scalars(
            &self,
            _ctx: &RequestContext,
            experiment_id: &str,
            _plugin_name: &str,
            downsample: Option<usize>,
            run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<Vec<ScalarDatum>>> {
            assert_eq!(downsample, None);
            if experiment_id != "exp" {
                return Err(ProviderError::not_found(experiment_id));
            }
            let point = |step: i64| ScalarDatum {
                step,
                wall_time: 0.5 * step as f64,
                value: step as f64,
            };
            let mut reading = RunTagMap::new();
            for (run, tag, points) in [
                ("train", "loss", vec![point(0), point(1), point(2)]),
                ("train", "empty", vec![]),
                ("test", "loss", vec![point(7)]),
            ] {
                if run_tag_filter.is_none_or(|filter| filter.matches(run, tag)) {
                    reading
                        .entry(run.to_string())
                        .or_insert_with(Default::default)
                        .insert(tag.to_string(), points);
                }
            }
            Ok(reading)
        }

        async fn list_tensors(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
            _plugin_name: &str,
            _run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<TensorTimeSeries>> {
            Err(ProviderError::unimplemented("list_tensors"))
        }

        async fn read_tensors(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
            _plugin_name: &str,
            _downsample: Option<usize>,
            _run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<Vec<TensorDatum>>> {
            Err(ProviderError::unimplemented("read_tensors"))
        }

        async fn list_blob_sequences(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
            _plugin_name: &str,
            _run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<BlobSequenceTimeSeries>> {
            Err(ProviderError::unimplemented("list_blob_sequences"))
        }

        async fn read_blob_sequences(
            &self,
            _ctx: &RequestContext,
            _experiment_id: &str,
            _plugin_name: &str,
            _downsample: Option<usize>,
            _run_tag_filter: Option<&RunTagFilter>,
        ) -> ProviderResult<RunTagMap<Vec<BlobSequenceDatum>>> {
            Err(ProviderError::unimplemented("read_blob_sequences"))
        }

        async fn read_blob(&self, _ctx: &RequestContext, blob_key: &str) -> ProviderResult<Vec<u8>> {
            Err(ProviderError::not_found(blob_key))
        }

        fn name(&self) -> &str {
            "scalars-only"
        }
    }

    #[tokio::test]
    async fn read_last_scalars_keeps_final_point() {
        let ctx = RequestContext::new();
        let last = ScalarsOnly
            .read_last_scalars(&ctx, "exp", "scalars", None)
            .await
            .unwrap();

        assert_eq!(last["train"]["loss"].step, 2);
        assert_eq!(last["test"]["loss"].step, 7);
        // Series without points have no last datum.
        assert!(!last["train"].contains_key("empty"));
    }

    #[tokio::test]
    async fn read_last_scalars_forwards_filter_and_errors() {
        let ctx = RequestContext::new();
        let filter = RunTagFilter::runs(["test"]);
        let last = ScalarsOnly
            .read_last_scalars(&ctx, "exp", "scalars", Some(&filter))
            .await
            .unwrap();
        assert_eq!(last.keys().collect::<Vec<_>>(), vec!["test"]);

        let err = ScalarsOnly
            .read_last_scalars(&ctx, "nope", "scalars", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn trait_is_object_safe() {
        let provider: std::sync::Arc<dyn DataProvider> = std::sync::Arc::new(ScalarsOnly);
        assert_eq!(provider.name(), "scalars-only");
    }
}
