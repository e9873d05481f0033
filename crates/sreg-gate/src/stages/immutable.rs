use crate::error::{ValidationError, Violation};
use crate::stage::{Candidate, Mode, StageDecision, ValidationStage};

/// Update-only: the specification `type` is fixed at creation.
pub struct ImmutableTypeStage;

impl ValidationStage for ImmutableTypeStage {
    fn name(&self) -> &str {
        "immutable-type"
    }

    fn applies_to(&self, mode: Mode) -> bool {
        mode == Mode::Update
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<StageDecision, ValidationError> {
        let Some(existing) = &candidate.existing else {
            return Err(ValidationError::stage(
                self.name(),
                "update candidate carries no existing entity",
            ));
        };
        let from = &existing.specification.spec_type;
        let to = &candidate.entity.specification.spec_type;
        if from == to {
            return Ok(StageDecision::Pass);
        }
        Ok(StageDecision::Fail(Violation::ImmutableField {
            field: "specification.type".into(),
            from: from.clone(),
            to: to.clone(),
        }))
    }
}
