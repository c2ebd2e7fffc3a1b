//! File-backed persistence for monitor settings and dedup state.
//!
//! Writes go to a temp file in the target directory which is then renamed
//! over the target, so a reader sees either the old or the new document.
//! Loading never fails: missing or unreadable data falls back to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{MonitorConfig, RoundKey};

pub const CONFIG_FILE_NAME: &str = "monitor_config.json";
pub const STATE_FILE_NAME: &str = "monitor_state.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted file, using defaults.");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read persisted file, using defaults.");
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed persisted file.");
            None
        }
    }
}

/// Persists `MonitorConfig` as a camelCase JSON document.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> MonitorConfig {
        read_json::<MonitorConfig>(&self.path)
            .map(MonitorConfig::sanitized)
            .unwrap_or_default()
    }

    pub fn save(&self, config: &MonitorConfig) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(config)?;
        write_atomic(&self.path, &bytes)
    }
}

/// Dedup state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeenState {
    pub seen_keys: BTreeSet<RoundKey>,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SeenStateStore {
    path: PathBuf,
}

impl SeenStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(STATE_FILE_NAME))
    }

    pub fn load(&self) -> SeenState {
        read_json(&self.path).unwrap_or_default()
    }

    pub fn save(&self, state: &SeenState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(state)?;
        write_atomic(&self.path, &bytes)
    }
}
