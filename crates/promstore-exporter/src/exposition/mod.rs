//! Text exposition of collected metric families.
//!
//! Turns the ordered output of `MetricStorage::collect` into the Prometheus
//! text format served by the `/metrics` handler. Rendering never reorders:
//! determinism comes from the store.

pub mod text;

pub use text::{render, CONTENT_TYPE};
