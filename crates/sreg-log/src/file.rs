use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task;
use tracing::{debug, info};

use crate::config::SyncMode;
use crate::error::{LogError, Result};
use crate::record::{LogPosition, LogRecord, PositionedRecord};
use crate::segment::Segment;
use crate::traits::EventLog;

/// A durable [`EventLog`] stored in one CRC-framed segment file.
///
/// All file I/O runs on the blocking pool; the segment sits behind a
/// mutex so appends are serialized and positions stay dense.
pub struct FileEventLog {
    path: PathBuf,
    segment: Arc<Mutex<Segment>>,
    head: Arc<watch::Sender<LogPosition>>,
}

impl FileEventLog {
    /// Open (or create) the segment at `path`, recovering its valid prefix.
    pub async fn open(path: impl Into<PathBuf>, sync_mode: SyncMode) -> Result<Self> {
        let path = path.into();
        let open_path = path.clone();
        let segment = task::spawn_blocking(move || Segment::open(&open_path, sync_mode))
            .await
            .map_err(join_error)??;

        let records = segment.len();
        let (head, _) = watch::channel(records);
        info!(path = %path.display(), records, "file log opened");

        Ok(Self {
            path,
            segment: Arc::new(Mutex::new(segment)),
            head: Arc::new(head),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn join_error(err: task::JoinError) -> LogError {
    LogError::Unavailable(format!("blocking log task failed: {err}"))
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, record: LogRecord) -> Result<LogPosition> {
        let payload = record.to_bytes()?;
        let segment = Arc::clone(&self.segment);
        let head = Arc::clone(&self.head);
        // The head is published under the segment lock and inside the
        // blocking task, so it stays monotonic and still advances when the
        // caller stops waiting.
        let position = task::spawn_blocking(move || {
            let mut segment = segment.lock().map_err(|_| LogError::LockPoisoned)?;
            let position = segment.append(&payload)?;
            head.send_replace(position + 1);
            Ok::<_, LogError>(position)
        })
        .await
        .map_err(join_error)??;

        debug!(position, key = %record.key(), "file log append");
        Ok(position)
    }

    async fn read_from(&self, from: LogPosition, limit: usize) -> Result<Vec<PositionedRecord>> {
        let segment = Arc::clone(&self.segment);
        task::spawn_blocking(move || {
            let mut segment = segment.lock().map_err(|_| LogError::LockPoisoned)?;
            let end = segment.len().min(from.saturating_add(limit as u64));
            let mut batch = Vec::new();
            for position in from..end {
                let payload = segment.read(position)?;
                let record = LogRecord::from_bytes(&payload).map_err(|e| LogError::Corrupt {
                    position,
                    reason: e.to_string(),
                })?;
                batch.push(PositionedRecord { position, record });
            }
            Ok(batch)
        })
        .await
        .map_err(join_error)?
    }

    async fn head(&self) -> Result<LogPosition> {
        let segment = self.segment.lock().map_err(|_| LogError::LockPoisoned)?;
        Ok(segment.len())
    }

    fn subscribe(&self) -> watch::Receiver<LogPosition> {
        self.head.subscribe()
    }
}
