//! Event log for the stream registry.
//!
//! The log is the authoritative record of every accepted mutation. This
//! crate defines the record wire shape, the [`EventLog`] transport trait,
//! two transports (in-memory and a CRC-framed segment file), and the
//! [`EventSender`] that is the registry's only write path.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod record;
mod segment;
pub mod sender;
pub mod traits;

pub use config::{LogBackend, LogConfig, SyncMode};
pub use error::LogError;
pub use file::FileEventLog;
pub use memory::InMemoryEventLog;
pub use record::{LogPosition, LogRecord, Mutation, Operation, PositionedRecord};
pub use sender::EventSender;
pub use traits::EventLog;
