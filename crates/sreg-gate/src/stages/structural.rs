use sreg_types::{Key, RESERVED_KEY_CHARS};

use crate::error::{ValidationError, Violation};
use crate::stage::{Candidate, StageDecision, ValidationStage};

/// Shape rules that need nothing but the candidate itself.
///
/// Checks the key (names non-empty and free of reserved characters,
/// versions at least 1), the specification fields, and finally the
/// model's own structural rules.
pub struct StructuralStage {
    max_description_len: usize,
}

impl StructuralStage {
    pub fn new(max_description_len: usize) -> Self {
        Self {
            max_description_len,
        }
    }

    fn check(&self, candidate: &Candidate) -> Result<(), Violation> {
        check_key(&candidate.entity.key)?;

        let spec = &candidate.entity.specification;
        if spec.spec_type.trim().is_empty() {
            return Err(Violation::structural("specification.type", "must not be empty"));
        }
        if !spec.configuration.is_object() {
            return Err(Violation::structural(
                "specification.configuration",
                "must be a JSON object",
            ));
        }
        let description_len = spec.description.chars().count();
        if description_len > self.max_description_len {
            return Err(Violation::structural(
                "specification.description",
                format!(
                    "{description_len} characters exceeds the limit of {}",
                    self.max_description_len
                ),
            ));
        }
        if spec.tags.iter().any(|t| t.name.trim().is_empty()) {
            return Err(Violation::structural(
                "specification.tags",
                "tag names must not be empty",
            ));
        }
        for (i, security) in spec.security.iter().enumerate() {
            if security.role.trim().is_empty() {
                return Err(Violation::structural(
                    format!("specification.security[{i}].role"),
                    "must not be empty",
                ));
            }
            if security.principals.iter().any(|p| p.name.trim().is_empty()) {
                return Err(Violation::structural(
                    format!("specification.security[{i}].principals"),
                    "principal names must not be empty",
                ));
            }
        }

        candidate
            .structure
            .clone()
            .map_err(|(field, reason)| Violation::Structural { field, reason })
    }
}

fn check_key(key: &Key) -> Result<(), Violation> {
    let name = key.name();
    if name.trim().is_empty() {
        return Err(Violation::structural(
            format!("key.{}.name", key.entity_type()),
            "must not be empty",
        ));
    }
    if let Some(c) = name.chars().find(|c| RESERVED_KEY_CHARS.contains(c)) {
        return Err(Violation::structural(
            format!("key.{}.name", key.entity_type()),
            format!("'{name}' contains reserved character '{c}'"),
        ));
    }
    if key.version() == Some(0) {
        return Err(Violation::structural(
            format!("key.{}.version", key.entity_type()),
            "must be at least 1",
        ));
    }
    key.parents().iter().try_for_each(check_key)
}

impl ValidationStage for StructuralStage {
    fn name(&self) -> &str {
        "structural"
    }

    fn evaluate(&self, candidate: &Candidate) -> Result<StageDecision, ValidationError> {
        Ok(self.check(candidate).into())
    }
}
