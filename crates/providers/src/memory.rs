// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory data provider
//!
//! [`MemoryDataProvider`] keeps experiments, time series and blobs in
//! concurrent maps. It is useful as a backend for tests and demos, and as a
//! reference for how a backend is expected to honour run/tag filters,
//! downsampling and blob keys.
//!
//! Blob keys are minted as `{provider name}/{uuid}` and are only recognized by
//! the provider instance that minted them.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use data_provider::{
    BlobReference, BlobSequenceDatum, BlobSequenceTimeSeries, DataProvider, ExperimentMetadata,
    ProviderError, ProviderResult, RequestContext, Run, RunTagFilter, RunTagMap, ScalarDatum,
    ScalarTimeSeries, TensorDatum, TensorTimeSeries,
};
use tracing::{debug, trace};
use uuid::Uuid;

/// Identifies one time series within an experiment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    /// Run name
    pub run: String,
    /// Tag name
    pub tag: String,
    /// Plugin that owns the series
    pub plugin_name: String,
}

impl SeriesKey {
    /// Create a series key
    pub fn new(run: impl Into<String>, tag: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            tag: tag.into(),
            plugin_name: plugin_name.into(),
        }
    }
}

/// Descriptive fields reported in series listings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeriesAnnotation {
    /// Description (possibly Markdown)
    pub description: String,
    /// Name to show in place of the tag
    pub display_name: String,
    /// Opaque plugin-specific metadata
    pub plugin_content: Vec<u8>,
}

trait Point: Clone {
    fn step(&self) -> i64;
    fn wall_time(&self) -> f64;
}

impl Point for ScalarDatum {
    fn step(&self) -> i64 {
        self.step
    }

    fn wall_time(&self) -> f64 {
        self.wall_time
    }
}

impl Point for TensorDatum {
    fn step(&self) -> i64 {
        self.step
    }

    fn wall_time(&self) -> f64 {
        self.wall_time
    }
}

impl Point for BlobSequenceDatum {
    fn step(&self) -> i64 {
        self.step
    }

    fn wall_time(&self) -> f64 {
        self.wall_time
    }
}

/// plugin name -> run -> tag -> points ordered by step
type SeriesStore<D> = BTreeMap<String, RunTagMap<Vec<D>>>;

#[derive(Debug, Default)]
struct ExperimentData {
    metadata: ExperimentMetadata,
    runs: BTreeMap<String, Option<f64>>,
    annotations: BTreeMap<SeriesKey, SeriesAnnotation>,
    scalars: SeriesStore<ScalarDatum>,
    tensors: SeriesStore<TensorDatum>,
    blob_sequences: SeriesStore<BlobSequenceDatum>,
}

impl ExperimentData {
    /// Declare a run; its start time is the earliest one ever reported
    fn declare_run(&mut self, run: &str, reported: Option<f64>) {
        let start_time = self.runs.entry(run.to_string()).or_insert(None);
        if let Some(reported) = reported
            && start_time.is_none_or(|start| reported < start)
        {
            *start_time = Some(reported);
        }
    }

    fn touch_run(&mut self, run: &str, wall_time: f64) {
        self.declare_run(run, Some(wall_time));
    }

    fn annotation(&self, plugin_name: &str, run: &str, tag: &str) -> SeriesAnnotation {
        self.annotations
            .get(&SeriesKey::new(run, tag, plugin_name))
            .cloned()
            .unwrap_or_default()
    }
}

/// Insert a point keeping the series ordered by step; a point at an existing
/// step replaces it.
fn insert_point<D: Point>(store: &mut SeriesStore<D>, key: &SeriesKey, datum: D) {
    let points = store
        .entry(key.plugin_name.clone())
        .or_default()
        .entry(key.run.clone())
        .or_default()
        .entry(key.tag.clone())
        .or_default();
    match points.binary_search_by_key(&datum.step(), Point::step) {
        Ok(index) => points[index] = datum,
        Err(index) => points.insert(index, datum),
    }
}

/// Evenly strided subset of at most `limit` points, always keeping the last one
fn downsample<D: Clone>(points: &[D], limit: Option<usize>) -> Vec<D> {
    let len = points.len();
    match limit {
        None => points.to_vec(),
        Some(limit) if limit >= len => points.to_vec(),
        Some(0) => Vec::new(),
        Some(1) => points[len - 1..].to_vec(),
        Some(limit) => (0..limit)
            .map(|i| points[i * (len - 1) / (limit - 1)].clone())
            .collect(),
    }
}

/// Apply `summarize` to every series of a plugin that passes the filter.
/// Runs left without any matching tag are omitted.
fn collect_series<D, T>(
    store: &SeriesStore<D>,
    plugin_name: &str,
    run_tag_filter: Option<&RunTagFilter>,
    mut summarize: impl FnMut(&str, &str, &[D]) -> T,
) -> RunTagMap<T> {
    let Some(runs) = store.get(plugin_name) else {
        return RunTagMap::new();
    };
    runs.iter()
        .filter(|(run, _)| run_tag_filter.is_none_or(|filter| filter.matches_run(run)))
        .filter_map(|(run, tags)| {
            let selected: BTreeMap<String, T> = tags
                .iter()
                .filter(|(tag, _)| run_tag_filter.is_none_or(|filter| filter.matches_tag(tag)))
                .map(|(tag, points)| (tag.clone(), summarize(run, tag, points)))
                .collect();
            (!selected.is_empty()).then(|| (run.clone(), selected))
        })
        .collect()
}

fn max_wall_time<D: Point>(points: &[D]) -> f64 {
    points
        .iter()
        .map(Point::wall_time)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn max_step<D: Point>(points: &[D]) -> i64 {
    points.last().map_or(0, Point::step)
}

/// Data provider backed by in-process concurrent maps
#[derive(Debug)]
pub struct MemoryDataProvider {
    name: String,
    experiments: DashMap<String, ExperimentData>,
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryDataProvider {
    /// Create an empty provider; the name appears in logs and blob keys
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            experiments: DashMap::new(),
            blobs: DashMap::new(),
        }
    }

    /// Number of experiments held
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of blobs held
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Create an experiment
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidArgument`] if the experiment exists.
    pub fn create_experiment(
        &self,
        experiment_id: impl Into<String>,
        metadata: ExperimentMetadata,
    ) -> ProviderResult<()> {
        let experiment_id = experiment_id.into();
        match self.experiments.entry(experiment_id) {
            Entry::Occupied(entry) => Err(ProviderError::invalid_argument(format!(
                "Experiment '{}' already exists in provider {}",
                entry.key(),
                self.name
            ))),
            Entry::Vacant(entry) => {
                debug!("Provider {} created experiment {}", self.name, entry.key());
                entry.insert(ExperimentData {
                    metadata,
                    ..ExperimentData::default()
                });
                Ok(())
            }
        }
    }

    /// Declare a run, optionally with its start time
    ///
    /// Declaring an existing run never discards its start time; an earlier
    /// `start_time` replaces a later one.
    pub fn add_run(
        &self,
        experiment_id: &str,
        run: impl Into<String>,
        start_time: Option<f64>,
    ) -> ProviderResult<()> {
        let run = run.into();
        self.with_experiment_mut(experiment_id, |experiment| {
            experiment.declare_run(&run, start_time);
        })
    }

    /// Set the description fields reported for a series
    pub fn annotate_series(
        &self,
        experiment_id: &str,
        key: &SeriesKey,
        annotation: SeriesAnnotation,
    ) -> ProviderResult<()> {
        self.with_experiment_mut(experiment_id, |experiment| {
            experiment.annotations.insert(key.clone(), annotation);
        })
    }

    /// Append a scalar point
    pub fn write_scalar(
        &self,
        experiment_id: &str,
        key: &SeriesKey,
        datum: ScalarDatum,
    ) -> ProviderResult<()> {
        self.with_experiment_mut(experiment_id, |experiment| {
            experiment.touch_run(&key.run, datum.wall_time);
            insert_point(&mut experiment.scalars, key, datum);
        })
    }

    /// Append a tensor point
    pub fn write_tensor(
        &self,
        experiment_id: &str,
        key: &SeriesKey,
        datum: TensorDatum,
    ) -> ProviderResult<()> {
        self.with_experiment_mut(experiment_id, |experiment| {
            experiment.touch_run(&key.run, datum.wall_time);
            insert_point(&mut experiment.tensors, key, datum);
        })
    }

    /// Store a sequence of blobs at one step and return their references
    pub fn write_blob_sequence(
        &self,
        experiment_id: &str,
        key: &SeriesKey,
        step: i64,
        wall_time: f64,
        payloads: Vec<Vec<u8>>,
    ) -> ProviderResult<Vec<BlobReference>> {
        if !self.experiments.contains_key(experiment_id) {
            return Err(self.experiment_not_found(experiment_id));
        }
        let values: Vec<BlobReference> = payloads
            .into_iter()
            .map(|payload| BlobReference::new(self.put_blob(payload)))
            .collect();
        let datum = BlobSequenceDatum {
            step,
            wall_time,
            values: values.clone(),
        };
        self.with_experiment_mut(experiment_id, |experiment| {
            experiment.touch_run(&key.run, wall_time);
            insert_point(&mut experiment.blob_sequences, key, datum);
        })?;
        Ok(values)
    }

    /// Store a standalone blob and return its freshly minted key
    pub fn put_blob(&self, payload: Vec<u8>) -> String {
        let blob_key = format!("{}/{}", self.name, Uuid::new_v4());
        trace!("Provider {} stored blob {} ({} bytes)", self.name, blob_key, payload.len());
        self.blobs.insert(blob_key.clone(), payload);
        blob_key
    }

    fn experiment_not_found(&self, experiment_id: &str) -> ProviderError {
        ProviderError::not_found(format!(
            "Experiment '{experiment_id}' not found in provider {}",
            self.name
        ))
    }

    fn with_experiment<T>(
        &self,
        experiment_id: &str,
        f: impl FnOnce(&ExperimentData) -> T,
    ) -> ProviderResult<T> {
        self.experiments
            .get(experiment_id)
            .map(|experiment| f(&experiment))
            .ok_or_else(|| self.experiment_not_found(experiment_id))
    }

    fn with_experiment_mut<T>(
        &self,
        experiment_id: &str,
        f: impl FnOnce(&mut ExperimentData) -> T,
    ) -> ProviderResult<T> {
        self.experiments
            .get_mut(experiment_id)
            .map(|mut experiment| f(&mut experiment))
            .ok_or_else(|| self.experiment_not_found(experiment_id))
    }
}

#[async_trait]
impl DataProvider for MemoryDataProvider {
    async fn experiment_metadata(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<ExperimentMetadata> {
        self.with_experiment(experiment_id, |experiment| experiment.metadata.clone())
    }

    async fn list_plugins(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<Vec<String>> {
        self.with_experiment(experiment_id, |experiment| {
            experiment
                .scalars
                .keys()
                .chain(experiment.tensors.keys())
                .chain(experiment.blob_sequences.keys())
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }

    async fn list_runs(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
    ) -> ProviderResult<Vec<Run>> {
        self.with_experiment(experiment_id, |experiment| {
            experiment
                .runs
                .iter()
                .map(|(name, start_time)| Run {
                    run_id: name.clone(),
                    run_name: name.clone(),
                    start_time: *start_time,
                })
                .collect()
        })
    }

    async fn list_scalars(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarTimeSeries>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(
                &experiment.scalars,
                plugin_name,
                run_tag_filter,
                |run, tag, points| {
                    let annotation = experiment.annotation(plugin_name, run, tag);
                    ScalarTimeSeries {
                        max_step: max_step(points),
                        max_wall_time: max_wall_time(points),
                        plugin_content: annotation.plugin_content,
                        description: annotation.description,
                        display_name: annotation.display_name,
                    }
                },
            )
        })
    }

    async fn read_scalars(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample_to: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<ScalarDatum>>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(&experiment.scalars, plugin_name, run_tag_filter, |_, _, points| {
                downsample(points, downsample_to)
            })
        })
    }

    async fn read_last_scalars(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<ScalarDatum>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(
                &experiment.scalars,
                plugin_name,
                run_tag_filter,
                |_, _, points| points.last().copied(),
            )
            .into_iter()
            .map(|(run, tags)| {
                let tags = tags
                    .into_iter()
                    .filter_map(|(tag, datum)| datum.map(|datum| (tag, datum)))
                    .collect();
                (run, tags)
            })
            .collect()
        })
    }

    async fn list_tensors(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<TensorTimeSeries>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(
                &experiment.tensors,
                plugin_name,
                run_tag_filter,
                |run, tag, points| {
                    let annotation = experiment.annotation(plugin_name, run, tag);
                    TensorTimeSeries {
                        max_step: max_step(points),
                        max_wall_time: max_wall_time(points),
                        plugin_content: annotation.plugin_content,
                        description: annotation.description,
                        display_name: annotation.display_name,
                    }
                },
            )
        })
    }

    async fn read_tensors(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample_to: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<TensorDatum>>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(&experiment.tensors, plugin_name, run_tag_filter, |_, _, points| {
                downsample(points, downsample_to)
            })
        })
    }

    async fn list_blob_sequences(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<BlobSequenceTimeSeries>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(
                &experiment.blob_sequences,
                plugin_name,
                run_tag_filter,
                |run, tag, points| {
                    let annotation = experiment.annotation(plugin_name, run, tag);
                    BlobSequenceTimeSeries {
                        max_step: max_step(points),
                        max_wall_time: max_wall_time(points),
                        max_length: points
                            .iter()
                            .map(|datum| datum.values.len())
                            .max()
                            .unwrap_or(0),
                        plugin_content: annotation.plugin_content,
                        description: annotation.description,
                        display_name: annotation.display_name,
                    }
                },
            )
        })
    }

    async fn read_blob_sequences(
        &self,
        _ctx: &RequestContext,
        experiment_id: &str,
        plugin_name: &str,
        downsample_to: Option<usize>,
        run_tag_filter: Option<&RunTagFilter>,
    ) -> ProviderResult<RunTagMap<Vec<BlobSequenceDatum>>> {
        self.with_experiment(experiment_id, |experiment| {
            collect_series(
                &experiment.blob_sequences,
                plugin_name,
                run_tag_filter,
                |_, _, points| downsample(points, downsample_to),
            )
        })
    }

    async fn read_blob(&self, _ctx: &RequestContext, blob_key: &str) -> ProviderResult<Vec<u8>> {
        self.blobs
            .get(blob_key)
            .map(|blob| blob.value().clone())
            .ok_or_else(|| {
                ProviderError::not_found(format!(
                    "Blob key '{blob_key}' not recognized by provider {}",
                    self.name
                ))
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
