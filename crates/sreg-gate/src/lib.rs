//! Validator chain for the stream registry.
//!
//! Every candidate create or update passes through the chain before it can
//! be appended to the log. The chain runs an ordered pipeline of stages
//! (structural, referential, schema, update-only invariants) and stops at
//! the first violation.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use sreg_gate::{GateConfig, SchemaRegistry, ValidatorChain};
//! use sreg_types::{Domain, DomainKey, Specification};
//! use sreg_view::ViewSet;
//!
//! let chain = ValidatorChain::with_default_stages(
//!     GateConfig::default(),
//!     Arc::new(ViewSet::new()),
//!     Arc::new(SchemaRegistry::default()),
//! );
//! let domain = Domain::new(DomainKey::new("acme"), Specification::new("", "default"));
//! let report = chain.validate_for_create(&domain).unwrap();
//! assert!(report.is_accepted());
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod schema;
pub mod stage;
pub mod stages;

pub use chain::{ValidationReport, ValidatorChain};
pub use config::GateConfig;
pub use error::{SchemaError, ValidationError, Violation};
pub use schema::{JsonKind, ObjectSchema, RequiredFieldsSchema, SchemaRegistry, SchemaValidator};
pub use stage::{Candidate, Mode, StageDecision, StageResult, ValidationStage};
pub use stages::{ImmutableTypeStage, ReferentialStage, SchemaStage, StructuralStage};
