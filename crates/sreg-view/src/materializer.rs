use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sreg_log::{EventLog, LogError, LogPosition, PositionedRecord};

use crate::error::{Result, ViewError};
use crate::set::ViewSet;

/// Tuning for the background fold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    /// Records read from the log per batch.
    pub batch_size: usize,
    /// Fallback wake-up interval when no head notification arrives.
    pub poll_interval_ms: u64,
    /// Upper bound for [`Materializer::wait_for`].
    pub wait_timeout_ms: u64,
    /// Upper bound for a single log read. Expiry surfaces as
    /// [`LogError::Timeout`].
    pub read_timeout_ms: u64,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            poll_interval_ms: 250,
            wait_timeout_ms: 5_000,
            read_timeout_ms: 5_000,
        }
    }
}

/// The single writer for a [`ViewSet`].
///
/// Keeps a cursor into the log and folds everything past it, routing each
/// record to the view of its entity type. `catch_up` is serialized, so the
/// background task and explicit catch-ups never apply a batch twice.
pub struct Materializer {
    log: Arc<dyn EventLog>,
    views: Arc<ViewSet>,
    cursor: Mutex<LogPosition>,
    config: MaterializerConfig,
}

impl Materializer {
    pub fn new(log: Arc<dyn EventLog>, views: Arc<ViewSet>, config: MaterializerConfig) -> Self {
        Self {
            log,
            views,
            cursor: Mutex::new(0),
            config,
        }
    }

    pub fn views(&self) -> &Arc<ViewSet> {
        &self.views
    }

    /// Fold every record currently in the log. Returns the new cursor (the
    /// next position to read).
    pub async fn catch_up(&self) -> Result<LogPosition> {
        let mut cursor = self.cursor.lock().await;
        let batch_size = self.config.batch_size.max(1);
        loop {
            let batch = self.read_batch(*cursor, batch_size).await?;
            if batch.is_empty() {
                break;
            }
            let read = batch.len();
            for record in &batch {
                self.views.apply(record)?;
                *cursor = record.position + 1;
            }
            debug!(cursor = *cursor, read, "materializer batch applied");
            if read < batch_size {
                break;
            }
        }
        Ok(*cursor)
    }

    async fn read_batch(&self, from: LogPosition, limit: usize) -> Result<Vec<PositionedRecord>> {
        let millis = self.config.read_timeout_ms;
        let read = self.log.read_from(from, limit);
        match tokio::time::timeout(Duration::from_millis(millis), read).await {
            Ok(batch) => Ok(batch?),
            Err(_) => {
                warn!(from, millis, "log read timed out");
                Err(ViewError::Log(LogError::Timeout { millis }))
            }
        }
    }

    /// Catch up until `position` has been applied, waiting for it to be
    /// appended if necessary.
    pub async fn wait_for(&self, position: LogPosition) -> Result<()> {
        let mut head = self.log.subscribe();
        let wait = async {
            loop {
                if self.catch_up().await? > position {
                    return Ok(());
                }
                if head.changed().await.is_err() {
                    return Err(ViewError::WaitTimeout { position });
                }
            }
        };
        tokio::time::timeout(Duration::from_millis(self.config.wait_timeout_ms), wait)
            .await
            .map_err(|_| ViewError::WaitTimeout { position })?
    }

    /// Start the background fold. It wakes on every head change (or the
    /// poll interval) and runs until the returned handle is shut down.
    pub fn spawn(self: Arc<Self>) -> MaterializerHandle {
        let (stop, mut stopped) = watch::channel(false);
        let mut head = self.log.subscribe();
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));

        let task = tokio::spawn(async move {
            info!("materializer started");
            loop {
                if let Err(err) = self.catch_up().await {
                    warn!(error = %err, "materializer catch-up failed");
                }
                tokio::select! {
                    _ = stopped.changed() => break,
                    changed = head.changed() => {
                        if changed.is_err() {
                            tokio::time::sleep(poll).await;
                        }
                    }
                    _ = tokio::time::sleep(poll) => {}
                }
            }
            info!("materializer stopped");
        });

        MaterializerHandle { stop, task }
    }
}

/// Handle to a running background fold.
pub struct MaterializerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaterializerHandle {
    /// Stop the fold and wait for the task to finish.
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "materializer task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sreg_log::{InMemoryEventLog, LogRecord};
    use sreg_types::{Entity, EntityType, Key, Specification};

    fn domain(name: &str) -> LogRecord {
        LogRecord::upsert(Entity {
            key: Key::new(EntityType::Domain, name),
            specification: Specification::new("", "default"),
            links: Default::default(),
            status: None,
        })
    }

    fn setup(batch_size: usize) -> (Arc<InMemoryEventLog>, Arc<Materializer>) {
        let log = Arc::new(InMemoryEventLog::new());
        let config = MaterializerConfig {
            batch_size,
            ..MaterializerConfig::default()
        };
        let materializer = Arc::new(Materializer::new(
            log.clone(),
            Arc::new(ViewSet::new()),
            config,
        ));
        (log, materializer)
    }

    #[tokio::test]
    async fn catch_up_reads_across_batches() {
        let (log, materializer) = setup(2);
        for name in ["a", "b", "c", "d", "e"] {
            log.append(domain(name)).await.unwrap();
        }
        log.append(LogRecord::tombstone(Key::new(EntityType::Domain, "c")))
            .await
            .unwrap();

        assert_eq!(materializer.catch_up().await.unwrap(), 6);
        let view = materializer.views().view(EntityType::Domain);
        assert_eq!(view.len().unwrap(), 4);
        assert_eq!(view.position().unwrap(), Some(5));
        // Nothing new: the cursor stays put.
        assert_eq!(materializer.catch_up().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn wait_for_applies_the_requested_position() {
        let (log, materializer) = setup(16);
        let position = log.append(domain("acme")).await.unwrap();
        materializer.wait_for(position).await.unwrap();
        assert!(materializer
            .views()
            .exists(&Key::new(EntityType::Domain, "acme"))
            .unwrap());
    }

    #[tokio::test]
    async fn wait_for_an_unwritten_position_times_out() {
        let log = Arc::new(InMemoryEventLog::new());
        let materializer = Materializer::new(
            log,
            Arc::new(ViewSet::new()),
            MaterializerConfig {
                wait_timeout_ms: 20,
                ..MaterializerConfig::default()
            },
        );
        assert!(matches!(
            materializer.wait_for(3).await,
            Err(ViewError::WaitTimeout { position: 3 })
        ));
    }

    #[tokio::test]
    async fn background_fold_converges_and_stops() {
        let (log, materializer) = setup(16);
        let handle = Arc::clone(&materializer).spawn();

        log.append(domain("acme")).await.unwrap();
        log.append(domain("globex")).await.unwrap();

        let view = Arc::clone(materializer.views().view(EntityType::Domain));
        tokio::time::timeout(Duration::from_secs(5), async {
            while view.len().unwrap() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        handle.shutdown().await;
        log.append(domain("initech")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(view.len().unwrap(), 2);
    }

    /// Appends land in memory; reads never complete.
    struct StalledReads(InMemoryEventLog);

    #[async_trait::async_trait]
    impl EventLog for StalledReads {
        async fn append(&self, record: LogRecord) -> sreg_log::error::Result<LogPosition> {
            self.0.append(record).await
        }

        async fn read_from(
            &self,
            _from: LogPosition,
            _limit: usize,
        ) -> sreg_log::error::Result<Vec<PositionedRecord>> {
            std::future::pending().await
        }

        async fn head(&self) -> sreg_log::error::Result<LogPosition> {
            self.0.head().await
        }

        fn subscribe(&self) -> watch::Receiver<LogPosition> {
            self.0.subscribe()
        }
    }

    fn stalled() -> (Arc<StalledReads>, Arc<Materializer>) {
        let log = Arc::new(StalledReads(InMemoryEventLog::new()));
        let materializer = Arc::new(Materializer::new(
            log.clone(),
            Arc::new(ViewSet::new()),
            MaterializerConfig {
                read_timeout_ms: 20,
                poll_interval_ms: 10,
                ..MaterializerConfig::default()
            },
        ));
        (log, materializer)
    }

    #[tokio::test]
    async fn stalled_read_times_out_as_unavailable() {
        let (log, materializer) = stalled();
        log.append(domain("acme")).await.unwrap();

        let err = tokio::time::timeout(Duration::from_secs(5), materializer.catch_up())
            .await
            .expect("catch-up is bounded by the read timeout")
            .unwrap_err();
        match err {
            ViewError::Log(err) => {
                assert!(matches!(err, LogError::Timeout { millis: 20 }));
                assert!(err.is_unavailable());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(materializer.views().view(EntityType::Domain).is_empty().unwrap());
    }

    #[tokio::test]
    async fn shutdown_completes_while_reads_stall() {
        let (log, materializer) = stalled();
        let handle = Arc::clone(&materializer).spawn();
        log.append(domain("acme")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown returns once the stalled read expires");
    }
}
