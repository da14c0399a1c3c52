use std::net::SocketAddr;

use serde::Deserialize;

use promstore_core::error::{Result, StoreError};
use promstore_core::{CorruptStatePolicy, StateFile};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub storage: StorageSection,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StoreError::UnsupportedVersion);
        }
        self.exporter.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            StoreError::BadConfig(format!("exporter.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9100".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Load state at startup and save it at shutdown.
    #[serde(default)]
    pub persist: bool,

    #[serde(default = "default_state_file")]
    pub state_file: String,

    #[serde(default)]
    pub on_corrupt: CorruptStatePolicy,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            persist: false,
            state_file: default_state_file(),
            on_corrupt: CorruptStatePolicy::default(),
        }
    }
}

impl StorageSection {
    pub fn validate(&self) -> Result<()> {
        if self.persist && self.state_file.trim().is_empty() {
            return Err(StoreError::BadConfig(
                "storage.state_file must not be empty when storage.persist is true".into(),
            ));
        }
        Ok(())
    }

    /// `None` when persistence is disabled.
    pub fn state_file(&self) -> Option<StateFile> {
        self.persist
            .then(|| StateFile::new(&self.state_file).with_policy(self.on_corrupt))
    }
}

fn default_state_file() -> String {
    "promstore-state.json".into()
}
