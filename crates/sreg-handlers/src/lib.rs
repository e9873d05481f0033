//! Lifecycle handlers for the stream registry.
//!
//! A handler runs after validation and before persistence. It can replace
//! the specification that gets stored, or veto the mutation. Handlers are
//! looked up by tags on the specification rather than by entity subtype.

pub mod builtin;
pub mod config;
pub mod error;
pub mod handler;
pub mod registry;

pub use builtin::{ConfigurationDefaultsHandler, PassThroughHandler};
pub use config::HandlerConfig;
pub use error::{HandlerError, HandlerResult};
pub use handler::LifecycleHandler;
pub use registry::{HandlerRegistry, HandlerService};
