use std::sync::Arc;

use sreg_view::ViewSet;

use crate::error::{ValidationError, Violation};
use crate::stage::{Candidate, StageDecision, ValidationStage};

/// Every referenced key must exist in its view.
///
/// Reads the views as they are now, so a reference appended moments ago
/// but not yet folded is reported missing.
pub struct ReferentialStage {
    views: Arc<ViewSet>,
}

impl ReferentialStage {
    pub fn new(views: Arc<ViewSet>) -> Self {
        Self { views }
    }
}

impl ValidationStage for ReferentialStage {
    fn name(&self) -> &str {
        "referential"
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<StageDecision, ValidationError> {
        for reference in &candidate.references {
            if !self.views.exists(&reference.key)? {
                return Ok(StageDecision::Fail(Violation::MissingReference {
                    field: reference.field.clone(),
                    key: reference.key.clone(),
                }));
            }
        }
        Ok(StageDecision::Pass)
    }
}
