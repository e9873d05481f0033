use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::file::FileEventLog;
use crate::memory::InMemoryEventLog;
use crate::traits::EventLog;

/// Flush strategy for the file log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append.
    EveryWrite,
    /// Rely on OS page-cache buffering.
    #[default]
    OsDefault,
}

/// Which log transport to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogBackend {
    #[default]
    Memory,
    File,
}

/// Configuration for the event log and the sender in front of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub backend: LogBackend,
    /// Segment file for the `file` backend.
    pub path: Option<PathBuf>,
    pub sync_mode: SyncMode,
    /// Upper bound on a single append, in milliseconds.
    pub append_timeout_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            backend: LogBackend::Memory,
            path: None,
            sync_mode: SyncMode::OsDefault,
            append_timeout_ms: 5_000,
        }
    }
}

impl LogConfig {
    /// A file-backed configuration at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: LogBackend::File,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn append_timeout(&self) -> Duration {
        Duration::from_millis(self.append_timeout_ms)
    }

    /// Open the configured transport.
    pub async fn open(&self) -> Result<Arc<dyn EventLog>> {
        match self.backend {
            LogBackend::Memory => Ok(Arc::new(InMemoryEventLog::new())),
            LogBackend::File => {
                let path = self.path.clone().ok_or(LogError::MissingPath)?;
                Ok(Arc::new(FileEventLog::open(path, self.sync_mode).await?))
            }
        }
    }
}
