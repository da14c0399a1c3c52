//! promstore core: in-process metric aggregation.
//!
//! Counters, gauges and histograms are accumulated in memory and collected
//! into deterministic, ordered metric families. The crate carries no async
//! runtime or transport so any exporter can embed it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed updates
//! surface as `StoreError::InvalidMetricData` and never leave a partial write.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod key;
pub mod model;
pub mod persist;
pub mod store;

/// Shared result type.
pub use error::{Result, StoreError};
pub use model::{Command, MetricFamily, MetricMeta, MetricType, Sample, UpdatePayload};
pub use persist::{CorruptStatePolicy, StateDocument, StateFile};
pub use store::{InMemoryStore, MetricStorage};
