use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{LogError, Result};
use crate::record::{LogPosition, LogRecord, PositionedRecord};
use crate::traits::EventLog;

/// An in-memory [`EventLog`] backed by a `Vec`.
///
/// Intended for tests and for embedding the registry without durability.
/// The log can be switched into an unavailable state to exercise failure
/// paths.
pub struct InMemoryEventLog {
    records: RwLock<Vec<LogRecord>>,
    head: watch::Sender<LogPosition>,
    unavailable: AtomicBool,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        let (head, _) = watch::channel(0);
        Self {
            records: RwLock::new(Vec::new()),
            head,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with [`LogError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LogError::Unavailable("in-memory log switched off".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, record: LogRecord) -> Result<LogPosition> {
        self.check_available()?;
        let position = {
            let mut records = self.records.write().map_err(|_| LogError::LockPoisoned)?;
            records.push(record);
            let head = records.len() as LogPosition;
            // Published under the write lock so the head never goes back.
            self.head.send_replace(head);
            head - 1
        };
        debug!(position, "in-memory append");
        Ok(position)
    }

    async fn read_from(&self, from: LogPosition, limit: usize) -> Result<Vec<PositionedRecord>> {
        self.check_available()?;
        let records = self.records.read().map_err(|_| LogError::LockPoisoned)?;
        let start = (from as usize).min(records.len());
        Ok(records[start..]
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, record)| PositionedRecord {
                position: (start + i) as LogPosition,
                record: record.clone(),
            })
            .collect())
    }

    async fn head(&self) -> Result<LogPosition> {
        self.check_available()?;
        let records = self.records.read().map_err(|_| LogError::LockPoisoned)?;
        Ok(records.len() as LogPosition)
    }

    fn subscribe(&self) -> watch::Receiver<LogPosition> {
        self.head.subscribe()
    }
}
