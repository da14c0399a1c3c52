//! In-memory aggregation store.
//!
//! One mutex guards the counter, gauge and histogram tables. Each update is a
//! single critical section: validate, create the entry on first touch, mutate
//! one sample. `collect` copies the tables under the lock and expands
//! histograms outside it, so reads never mutate state and always observe one
//! consistent point.
//!
//! Persistence is an explicit lifecycle: `open` hydrates from a `StateFile`,
//! `close` writes it back. Dropping a store never writes anything.

mod collect;
mod histogram;
mod table;

use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::model::{MetricFamily, UpdatePayload};
use crate::persist::{CorruptStatePolicy, StateDocument, StateFile};

pub use collect::compare_label_values;
use table::Tables;

/// Update and read surface of a metric storage backend.
pub trait MetricStorage: Send + Sync {
    fn update_counter(&self, payload: &UpdatePayload) -> Result<()>;
    fn update_gauge(&self, payload: &UpdatePayload) -> Result<()>;
    fn update_histogram(&self, payload: &UpdatePayload) -> Result<()>;
    /// Deterministic snapshot: counters, gauges, then histograms.
    fn collect(&self) -> Result<Vec<MetricFamily>>;
    /// Drop every metric.
    fn wipe(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    state_file: Option<StateFile>,
}

impl InMemoryStore {
    /// Empty store without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, hydrating it from `state_file` when one is given and exists.
    pub fn open(state_file: Option<StateFile>) -> Result<Self> {
        let tables = match &state_file {
            None => Tables::default(),
            Some(file) => match load_tables(file) {
                Ok(tables) => tables,
                Err(e) if file.on_corrupt() == CorruptStatePolicy::StartEmpty => {
                    warn!(path = %file.path().display(), error = %e, "discarding unusable state file");
                    Tables::default()
                }
                Err(e) => return Err(e),
            },
        };

        Ok(Self {
            tables: Mutex::new(tables),
            state_file,
        })
    }

    /// Hydrate from an already parsed document.
    pub fn from_document(doc: &StateDocument) -> Result<Self> {
        Ok(Self {
            tables: Mutex::new(Tables::from_document(doc)?),
            state_file: None,
        })
    }

    /// Persistence-boundary view of the current state.
    pub fn snapshot(&self) -> Result<StateDocument> {
        Ok(self.lock()?.to_document())
    }

    /// Write current state to the state file, if any. The store stays usable.
    pub fn close(&self) -> Result<()> {
        let Some(file) = &self.state_file else {
            return Ok(());
        };
        let doc = self.snapshot()?;
        file.save(&doc)?;
        info!(
            path = %file.path().display(),
            counters = doc.counters.len(),
            gauges = doc.gauges.len(),
            histograms = doc.histograms.len(),
            "metric state saved"
        );
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        // Poisoned mutex means a logic bug; report it instead of panicking.
        self.tables
            .lock()
            .map_err(|_| StoreError::Internal("metric tables lock poisoned".into()))
    }
}

fn load_tables(file: &StateFile) -> Result<Tables> {
    let Some(doc) = file.load()? else {
        return Ok(Tables::default());
    };
    let tables = Tables::from_document(&doc)?;
    info!(
        path = %file.path().display(),
        counters = doc.counters.len(),
        gauges = doc.gauges.len(),
        histograms = doc.histograms.len(),
        "metric state loaded"
    );
    Ok(tables)
}

impl MetricStorage for InMemoryStore {
    fn update_counter(&self, payload: &UpdatePayload) -> Result<()> {
        self.lock()?.update_counter(payload)
    }

    fn update_gauge(&self, payload: &UpdatePayload) -> Result<()> {
        self.lock()?.update_gauge(payload)
    }

    fn update_histogram(&self, payload: &UpdatePayload) -> Result<()> {
        self.lock()?.update_histogram(payload)
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let tables = self.lock()?.clone();
        Ok(collect::collect(&tables))
    }

    fn wipe(&self) -> Result<()> {
        *self.lock()? = Tables::default();
        Ok(())
    }
}
