use std::time::Duration;

use sreg_types::{Entity, Model, Reference};

use crate::error::{ValidationError, Violation};

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// Which operation a candidate is being validated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Everything a stage may inspect about the entity being admitted.
///
/// Built once from the typed model so stages stay object-safe and work for
/// every entity type.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub mode: Mode,
    pub entity: Entity,
    pub references: Vec<Reference>,
    /// Outcome of the model's own shape rules, as `(field, reason)`.
    pub structure: Result<(), (String, String)>,
    /// The stored entity an update replaces.
    pub existing: Option<Entity>,
}

impl Candidate {
    pub fn for_create<M: Model>(model: &M) -> Self {
        Self {
            mode: Mode::Create,
            entity: model.to_entity(),
            references: model.references(),
            structure: model.check_structure(),
            existing: None,
        }
    }

    pub fn for_update<M: Model>(model: &M, existing: &M) -> Self {
        Self {
            mode: Mode::Update,
            existing: Some(existing.to_entity()),
            ..Self::for_create(model)
        }
    }
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    Pass,
    Fail(Violation),
}

impl StageDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<Result<(), Violation>> for StageDecision {
    fn from(result: Result<(), Violation>) -> Self {
        match result {
            Ok(()) => Self::Pass,
            Err(violation) => Self::Fail(violation),
        }
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub passed: bool,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// ValidationStage trait
// ---------------------------------------------------------------------------

/// A single step of the validator chain.
///
/// Stages run in order and the first failure ends the chain. The trait is
/// object-safe and `Send + Sync` so stages can live in a
/// `Vec<Box<dyn ValidationStage>>`.
pub trait ValidationStage: Send + Sync {
    /// Short name used in reports and logs.
    fn name(&self) -> &str;

    /// Whether the stage runs for this mode. Update-only invariants
    /// return `false` for [`Mode::Create`].
    fn applies_to(&self, _mode: Mode) -> bool {
        true
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<StageDecision, ValidationError>;
}
