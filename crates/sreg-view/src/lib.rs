//! Materialized views for the stream registry.
//!
//! Readable registry state is derived, never written directly: the
//! [`Materializer`] folds the event log into one [`EntityView`] per entity
//! type, and the views serve point lookups and snapshot scans.
//!
//! - [`EntityView`]: copy-on-write map of key to entity for one type
//! - [`ViewSet`]: every view, routed by entity type
//! - [`Materializer`]: the single writer, run explicitly or in the background
//! - [`replay`]: deterministic fold of a record slice into a detached view

pub mod error;
pub mod materializer;
pub mod replay;
pub mod set;
pub mod view;

pub use error::ViewError;
pub use materializer::{Materializer, MaterializerConfig, MaterializerHandle};
pub use replay::{replay, replay_all};
pub use set::ViewSet;
pub use view::{EntityView, Scan};
