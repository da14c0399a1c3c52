//! Top-level facade crate for promstore.
//!
//! Re-exports the aggregation core and the exporter so users can depend on a single crate.

pub mod core {
    pub use promstore_core::*;
}

pub mod exporter {
    pub use promstore_exporter::*;
}
