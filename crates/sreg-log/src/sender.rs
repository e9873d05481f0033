use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use sreg_types::{Entity, Key};

use crate::error::{LogError, Result};
use crate::record::{LogPosition, LogRecord};
use crate::traits::EventLog;

/// The single write path into the log.
///
/// Each call appends exactly one record and is bounded by the configured
/// timeout. Failures are surfaced as-is; the sender never retries.
///
/// A timeout only stops the wait. An append already handed to the
/// transport (the file log's blocking write, for one) may still land after
/// [`LogError::Timeout`] is returned, so a timed-out write is "unknown",
/// not "absent". Callers that retry must tolerate the earlier record
/// showing up in the log.
#[derive(Clone)]
pub struct EventSender {
    log: Arc<dyn EventLog>,
    append_timeout: Duration,
}

impl EventSender {
    pub fn new(log: Arc<dyn EventLog>, append_timeout: Duration) -> Self {
        Self {
            log,
            append_timeout,
        }
    }

    /// Append an upsert of `entity` under its key.
    pub async fn upsert(&self, entity: Entity) -> Result<LogPosition> {
        self.send(LogRecord::upsert(entity)).await
    }

    /// Append a tombstone for `key`.
    pub async fn tombstone(&self, key: Key) -> Result<LogPosition> {
        self.send(LogRecord::tombstone(key)).await
    }

    pub async fn send(&self, record: LogRecord) -> Result<LogPosition> {
        let key = record.key().clone();
        let operation = record.operation();
        let position = tokio::time::timeout(self.append_timeout, self.log.append(record))
            .await
            .map_err(|_| LogError::Timeout {
                millis: self.append_timeout.as_millis() as u64,
            })??;
        debug!(%key, %operation, position, "record appended");
        Ok(position)
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }
}
