// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prefix-dispatching experiment data providers
//!
//! This crate combines several [`DataProvider`](data_provider::DataProvider)
//! backends behind one façade. Experiment ids of the form `prefix:local-id`
//! are routed to the backend registered under `prefix`; ids without a colon go
//! to an optional unprefixed backend. Blob keys, which carry no routing
//! information, are offered to each backend in a fixed order.
//!
//! # Components
//!
//! - **Registry**: [`ProviderRegistry`], the immutable prefix to provider map
//! - **Identifier Resolution**: [`IdentifierResolver`] splits experiment ids
//! - **Blob Resolution**: [`BlobResolver`] tries providers for a blob key
//! - **Dispatcher**: [`DispatchingDataProvider`] ties the above together
//! - **In-Memory Backend**: [`MemoryDataProvider`] for tests and demos
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use data_provider::{DataProvider, ExperimentMetadata, RequestContext};
//! use providers::{DispatchingDataProvider, MemoryDataProvider, ProviderRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let local = MemoryDataProvider::new("local");
//! local.create_experiment("123", ExperimentMetadata::at_location("/logs/123"))?;
//!
//! let registry = ProviderRegistry::builder()
//!     .register("local", Arc::new(local))?
//!     .build();
//! let dispatcher = DispatchingDataProvider::new(registry);
//!
//! let metadata = dispatcher
//!     .experiment_metadata(&RequestContext::new(), "local:123")
//!     .await?;
//! assert_eq!(metadata.data_location, "/logs/123");
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod config;
pub mod dispatching;
pub mod memory;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use blob::{BlobCandidate, BlobResolver, FallbackPosition};
pub use config::DispatchConfig;
pub use dispatching::DispatchingDataProvider;
pub use memory::{MemoryDataProvider, SeriesAnnotation, SeriesKey};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder, RegistryError};
pub use resolver::{IdentifierResolver, ResolveError, Resolved};
