//! Foundation types for the stream registry.
//!
//! Every other registry crate depends on `sreg-types`. It defines how
//! entities are identified and described, and the log-wire shape they
//! travel in.
//!
//! # Key Types
//!
//! - [`Key`]: hierarchical composite identifier (type, parents, name, version)
//! - [`Specification`] / [`Status`]: the declarative and operational halves of an entity
//! - [`Entity`]: the wire representation carried by the log and stored in views
//! - [`Model`] / [`ModelKey`]: traits the typed entity family implements
//! - [`models`]: Domain, Schema, Stream, Zone, Infrastructure, Producer,
//!   Consumer and the three binding kinds

pub mod entity;
pub mod error;
pub mod key;
pub mod keys;
pub mod model;
pub mod models;
pub mod specification;

pub use entity::{Entity, Links, Reference};
pub use error::TypeError;
pub use key::{EntityType, Key, RESERVED_KEY_CHARS};
pub use keys::{
    ConsumerBindingKey, ConsumerKey, DomainKey, InfrastructureKey, ProcessBindingKey,
    ProducerBindingKey, ProducerKey, SchemaKey, StreamBindingKey, StreamKey, ZoneKey,
};
pub use model::{Model, ModelKey};
pub use models::{
    Consumer, ConsumerBinding, Domain, Infrastructure, ProcessBinding, Producer,
    ProducerBinding, Schema, Stream, StreamBinding, Zone,
};
pub use specification::{Principal, Security, Specification, Status, Tag};
