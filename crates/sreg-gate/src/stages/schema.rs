use std::sync::Arc;

use crate::error::{ValidationError, Violation};
use crate::schema::SchemaRegistry;
use crate::stage::{Candidate, StageDecision, ValidationStage};

/// Validates the configuration against the schema selected by `type`.
pub struct SchemaStage {
    registry: Arc<SchemaRegistry>,
}

impl SchemaStage {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }
}

impl ValidationStage for SchemaStage {
    fn name(&self) -> &str {
        "schema"
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<StageDecision, ValidationError> {
        let spec = &candidate.entity.specification;
        Ok(self
            .registry
            .validate(&spec.spec_type, &spec.configuration)
            .map_err(Violation::from)
            .into())
    }
}
