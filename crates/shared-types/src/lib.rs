// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the experiment router
//!
//! This crate holds the identifier grammar shared by data providers and the
//! dispatching layer, avoiding circular dependencies between them.

pub mod experiment_id;
pub mod prefix;

pub use experiment_id::{ExperimentId, PREFIX_SEPARATOR};
pub use prefix::{PrefixError, ProviderPrefix};
