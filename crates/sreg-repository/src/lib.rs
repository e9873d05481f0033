//! Generic repositories for the stream registry.
//!
//! A [`Repository`] composes a [`Converter`], the event sender and the
//! entity view for one model type. It is the only layer that knows both
//! the typed model and its wire form.
//!
//! # Design Rules
//!
//! 1. Every write is exactly one log append; the view is never written directly.
//! 2. Reads are served from the view and may lag writes.
//! 3. Conversion is pure and lossless.

pub mod converter;
pub mod error;
pub mod repository;

pub use converter::{Converter, ModelConverter};
pub use error::{RepositoryError, RepositoryResult};
pub use repository::Repository;
