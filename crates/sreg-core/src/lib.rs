//! Stream registry core: services and the composition root.
//!
//! Every mutation follows the same pipeline: validate, run the lifecycle
//! handler, append to the log. Reads come from materialized views that
//! trail the log. Deleting an entity first deletes everything that
//! references it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sreg_core::{Registry, RegistryConfig};
//! use sreg_types::{Specification, Zone, ZoneKey};
//!
//! # async fn example() -> Result<(), sreg_core::ServiceError> {
//! let registry = Registry::open(RegistryConfig::default()).await?;
//! let zone = Zone::new(ZoneKey::new("aws-us-east"), Specification::new("", "cloud"));
//! registry.zones().create(&zone).await?;
//! registry.sync().await?;
//! assert!(registry.zones().get(&ZoneKey::new("aws-us-east")).await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod service;

pub use config::RegistryConfig;
pub use error::{ConfigError, ServiceError, ServiceResult};
pub use registry::Registry;
pub use service::{DependentService, EntityService};
