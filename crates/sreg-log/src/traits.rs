use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::record::{LogPosition, LogRecord, PositionedRecord};

/// An ordered, append-only log of mutation records.
///
/// Positions are assigned densely from zero in append order and never
/// change. Implementations must be safe to share across tasks; the core
/// holds them as `Arc<dyn EventLog>`.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one record and return the position it was assigned.
    async fn append(&self, record: LogRecord) -> Result<LogPosition>;

    /// Read up to `limit` records starting at position `from`.
    ///
    /// Returns an empty batch when `from` is at or past the head.
    async fn read_from(&self, from: LogPosition, limit: usize) -> Result<Vec<PositionedRecord>>;

    /// The position the next append will receive (the record count).
    async fn head(&self) -> Result<LogPosition>;

    /// A receiver that observes the head after every append.
    fn subscribe(&self) -> watch::Receiver<LogPosition>;
}
