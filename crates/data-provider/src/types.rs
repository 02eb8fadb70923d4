// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Value types returned by data providers
//!
//! These are plain data: a routing layer passes them along without looking at
//! run names, tag names, steps or values.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nested mapping from run name to tag name to a per-series value
pub type RunTagMap<T> = BTreeMap<String, BTreeMap<String, T>>;

/// Metadata describing an experiment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Human-readable description of where the data lives (a path or URL)
    pub data_location: String,
    /// User-facing experiment name
    pub experiment_name: String,
    /// Free-form description
    pub experiment_description: String,
    /// When the experiment was created, if known
    pub creation_time: Option<DateTime<Utc>>,
}

impl ExperimentMetadata {
    /// Metadata carrying only a data location
    pub fn at_location(data_location: impl Into<String>) -> Self {
        Self {
            data_location: data_location.into(),
            ..Self::default()
        }
    }
}

/// A run within an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Provider-assigned stable id
    pub run_id: String,
    /// User-facing run name, the key used in [`RunTagMap`]s
    pub run_name: String,
    /// Wall time of the first event in the run, in seconds since epoch
    pub start_time: Option<f64>,
}

/// Summary of a scalar time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarTimeSeries {
    /// Largest step in the series
    pub max_step: i64,
    /// Largest wall time in the series, in seconds since epoch
    pub max_wall_time: f64,
    /// Opaque plugin-specific metadata
    pub plugin_content: Vec<u8>,
    /// Description (possibly Markdown)
    pub description: String,
    /// Name to show in place of the tag
    pub display_name: String,
}

/// Summary of a tensor time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorTimeSeries {
    /// Largest step in the series
    pub max_step: i64,
    /// Largest wall time in the series, in seconds since epoch
    pub max_wall_time: f64,
    /// Opaque plugin-specific metadata
    pub plugin_content: Vec<u8>,
    /// Description (possibly Markdown)
    pub description: String,
    /// Name to show in place of the tag
    pub display_name: String,
}

/// Summary of a blob-sequence time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSequenceTimeSeries {
    /// Largest step in the series
    pub max_step: i64,
    /// Largest wall time in the series, in seconds since epoch
    pub max_wall_time: f64,
    /// Length of the longest blob sequence at any step
    pub max_length: usize,
    /// Opaque plugin-specific metadata
    pub plugin_content: Vec<u8>,
    /// Description (possibly Markdown)
    pub description: String,
    /// Name to show in place of the tag
    pub display_name: String,
}

/// A single scalar point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarDatum {
    /// Global step
    pub step: i64,
    /// Wall time in seconds since epoch
    pub wall_time: f64,
    /// Scalar value
    pub value: f64,
}

/// Dense numeric tensor payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tensor {
    /// Dimensions, outermost first
    pub shape: Vec<usize>,
    /// Values in row-major order
    pub values: Vec<f64>,
}

/// A single tensor point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorDatum {
    /// Global step
    pub step: i64,
    /// Wall time in seconds since epoch
    pub wall_time: f64,
    /// Tensor value
    pub value: Tensor,
}

/// A single blob-sequence point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSequenceDatum {
    /// Global step
    pub step: i64,
    /// Wall time in seconds since epoch
    pub wall_time: f64,
    /// References to the blobs at this step, in order
    pub values: Vec<BlobReference>,
}

/// Handle to a blob, resolvable through `read_blob`
///
/// The key is minted by the provider that produced it and means nothing to
/// anyone else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobReference {
    /// Opaque key accepted by `read_blob`
    pub blob_key: String,
    /// Optional direct download URL
    pub url: Option<String>,
}

impl BlobReference {
    /// Reference without a direct URL
    pub fn new(blob_key: impl Into<String>) -> Self {
        Self {
            blob_key: blob_key.into(),
            url: None,
        }
    }
}

/// Optional restriction of a query to a set of runs and/or tags
///
/// `None` on an axis means that axis is not filtered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunTagFilter {
    /// Runs to include, or `None` for all runs
    pub runs: Option<BTreeSet<String>>,
    /// Tags to include, or `None` for all tags
    pub tags: Option<BTreeSet<String>>,
}

impl RunTagFilter {
    /// Filter on both axes
    pub fn new<R, T>(runs: Option<R>, tags: Option<T>) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            runs: runs.map(|runs| runs.into_iter().map(Into::into).collect()),
            tags: tags.map(|tags| tags.into_iter().map(Into::into).collect()),
        }
    }

    /// Filter on runs only
    pub fn runs<R>(runs: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            runs: Some(runs.into_iter().map(Into::into).collect()),
            tags: None,
        }
    }

    /// Filter on tags only
    pub fn tags<T>(tags: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            runs: None,
            tags: Some(tags.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the run passes the run axis of the filter
    pub fn matches_run(&self, run: &str) -> bool {
        self.runs.as_ref().is_none_or(|runs| runs.contains(run))
    }

    /// Whether the tag passes the tag axis of the filter
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tags.as_ref().is_none_or(|tags| tags.contains(tag))
    }

    /// Whether a (run, tag) series passes the filter
    pub fn matches(&self, run: &str, tag: &str) -> bool {
        self.matches_run(run) && self.matches_tag(tag)
    }

    /// Whether the filter accepts everything
    pub fn is_unfiltered(&self) -> bool {
        self.runs.is_none() && self.tags.is_none()
    }
}
