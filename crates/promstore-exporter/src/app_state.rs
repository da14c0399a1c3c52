//! Shared application state for the promstore exporter.
//!
//! Owns the store for the process lifetime. Persistence follows the explicit
//! lifecycle: `new` opens (and hydrates) the store, `shutdown` closes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use promstore_core::error::Result;
use promstore_core::InMemoryStore;

use crate::config::ExporterConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    store: Arc<InMemoryStore>,
    draining: AtomicBool,
}

impl AppState {
    /// Open the store described by `cfg.storage`.
    /// Returns Result so main can report a bad state file instead of panicking.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let store = InMemoryStore::open(cfg.storage.state_file())?;
        Ok(Self::with_store(cfg, Arc::new(store)))
    }

    pub fn with_store(cfg: ExporterConfig, store: Arc<InMemoryStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<InMemoryStore> {
        Arc::clone(&self.inner.store)
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }

    /// Stop accepting traffic and persist the store.
    pub fn shutdown(&self) -> Result<()> {
        self.set_draining();
        self.inner.store.close()
    }
}
