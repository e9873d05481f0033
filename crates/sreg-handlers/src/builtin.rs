use async_trait::async_trait;
use serde_json::{Map, Value};

use sreg_types::{Entity, Specification};

use crate::error::HandlerResult;
use crate::handler::LifecycleHandler;

/// Persists every specification unchanged.
pub struct PassThroughHandler;

#[async_trait]
impl LifecycleHandler for PassThroughHandler {
    fn name(&self) -> &str {
        "pass-through"
    }
}

/// Fills configuration fields the caller left out from a defaults object.
///
/// Fields present in the candidate always win; the merge is shallow.
pub struct ConfigurationDefaultsHandler {
    name: String,
    defaults: Map<String, Value>,
}

impl ConfigurationDefaultsHandler {
    pub fn new(name: impl Into<String>, defaults: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            defaults,
        }
    }

    fn apply(&self, specification: &Specification) -> Specification {
        let mut merged = specification.clone();
        if let Value::Object(configuration) = &mut merged.configuration {
            for (field, value) in &self.defaults {
                configuration
                    .entry(field.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        merged
    }
}

#[async_trait]
impl LifecycleHandler for ConfigurationDefaultsHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle_insert(&self, candidate: &Entity) -> HandlerResult<Specification> {
        Ok(self.apply(&candidate.specification))
    }

    async fn handle_update(
        &self,
        candidate: &Entity,
        _existing: &Entity,
    ) -> HandlerResult<Specification> {
        Ok(self.apply(&candidate.specification))
    }
}
