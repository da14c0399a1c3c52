//! promstore exporter library entry.
//!
//! Wires the aggregation store into an HTTP surface: JSON update ingest,
//! text exposition, and health endpoints. Consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod app_state;
pub mod config;
pub mod exposition;
pub mod ops;
pub mod router;
