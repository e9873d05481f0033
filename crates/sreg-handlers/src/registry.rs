use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use sreg_types::{Entity, EntityType, Model, Specification};

use crate::builtin::{ConfigurationDefaultsHandler, PassThroughHandler};
use crate::config::HandlerConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::handler::LifecycleHandler;

/// Handlers selected by tags on the specification.
///
/// Lookup order: the `function` tag (when set and registered), then the
/// (entity type, `type`) pair, then `type` alone, then the default handler.
pub struct HandlerRegistry {
    by_function: HashMap<String, Arc<dyn LifecycleHandler>>,
    by_entity_type: HashMap<(EntityType, String), Arc<dyn LifecycleHandler>>,
    by_type: HashMap<String, Arc<dyn LifecycleHandler>>,
    default: Arc<dyn LifecycleHandler>,
    require_handler: bool,
}

impl HandlerRegistry {
    /// An empty registry that falls back to [`PassThroughHandler`].
    pub fn new() -> Self {
        Self {
            by_function: HashMap::new(),
            by_entity_type: HashMap::new(),
            by_type: HashMap::new(),
            default: Arc::new(PassThroughHandler),
            require_handler: false,
        }
    }

    pub fn from_config(config: &HandlerConfig) -> Self {
        let mut registry = Self::new();
        registry.require_handler = config.require_handler;
        for (spec_type, defaults) in &config.defaults {
            registry.register_type(
                spec_type.clone(),
                Arc::new(ConfigurationDefaultsHandler::new(
                    format!("{spec_type}-defaults"),
                    defaults.clone(),
                )),
            );
        }
        registry
    }

    pub fn set_require_handler(&mut self, require: bool) {
        self.require_handler = require;
    }

    pub fn set_default(&mut self, handler: Arc<dyn LifecycleHandler>) {
        self.default = handler;
    }

    pub fn register_function(
        &mut self,
        function: impl Into<String>,
        handler: Arc<dyn LifecycleHandler>,
    ) {
        self.by_function.insert(function.into(), handler);
    }

    /// Register a handler for one entity type's specifications of `spec_type`.
    pub fn register(
        &mut self,
        entity_type: EntityType,
        spec_type: impl Into<String>,
        handler: Arc<dyn LifecycleHandler>,
    ) {
        self.by_entity_type
            .insert((entity_type, spec_type.into()), handler);
    }

    /// Register a handler for `spec_type` on every entity type.
    pub fn register_type(&mut self, spec_type: impl Into<String>, handler: Arc<dyn LifecycleHandler>) {
        self.by_type.insert(spec_type.into(), handler);
    }

    pub fn resolve(&self, entity: &Entity) -> HandlerResult<Arc<dyn LifecycleHandler>> {
        let spec = &entity.specification;
        if let Some(function) = &spec.function {
            match self.by_function.get(function) {
                Some(handler) => return Ok(Arc::clone(handler)),
                None => debug!(%function, "no handler for function tag, trying type"),
            }
        }
        if let Some(handler) = self
            .by_entity_type
            .get(&(entity.entity_type(), spec.spec_type.clone()))
            .or_else(|| self.by_type.get(&spec.spec_type))
        {
            return Ok(Arc::clone(handler));
        }
        if self.require_handler {
            return Err(HandlerError::NoHandler {
                entity_type: entity.entity_type(),
                spec_type: spec.spec_type.clone(),
            });
        }
        Ok(Arc::clone(&self.default))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed front of the [`HandlerRegistry`]: resolves the handler for a model
/// and invokes exactly one hook.
#[derive(Clone)]
pub struct HandlerService {
    registry: Arc<HandlerRegistry>,
}

impl HandlerService {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub async fn handle_insert<M: Model>(&self, candidate: &M) -> HandlerResult<Specification> {
        let entity = candidate.to_entity();
        let handler = self.registry.resolve(&entity)?;
        debug!(handler = handler.name(), key = %entity.key, "insert handler");
        handler.handle_insert(&entity).await.inspect_err(|err| {
            warn!(handler = handler.name(), key = %entity.key, error = %err, "insert handler failed");
        })
    }

    pub async fn handle_update<M: Model>(
        &self,
        candidate: &M,
        existing: &M,
    ) -> HandlerResult<Specification> {
        let entity = candidate.to_entity();
        let handler = self.registry.resolve(&entity)?;
        debug!(handler = handler.name(), key = %entity.key, "update handler");
        handler
            .handle_update(&entity, &existing.to_entity())
            .await
            .inspect_err(|err| {
                warn!(handler = handler.name(), key = %entity.key, error = %err, "update handler failed");
            })
    }

    pub async fn handle_delete<M: Model>(&self, model: &M) -> HandlerResult<()> {
        let entity = model.to_entity();
        let handler = self.registry.resolve(&entity)?;
        debug!(handler = handler.name(), key = %entity.key, "delete handler");
        handler.handle_delete(&entity).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use sreg_types::{Zone, ZoneKey};

    struct Named(&'static str);

    #[async_trait]
    impl LifecycleHandler for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    struct Veto;

    #[async_trait]
    impl LifecycleHandler for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        async fn handle_insert(&self, _candidate: &Entity) -> HandlerResult<Specification> {
            Err(HandlerError::rejected("veto", "not today"))
        }
    }

    fn zone(spec: Specification) -> Entity {
        Zone::new(ZoneKey::new("aws"), spec).to_entity()
    }

    fn resolved(registry: &HandlerRegistry, spec: Specification) -> String {
        registry.resolve(&zone(spec)).unwrap().name().to_string()
    }

    #[test]
    fn lookup_order_is_function_then_pair_then_type_then_default() {
        let mut registry = HandlerRegistry::new();
        registry.register_function("provision", Arc::new(Named("function")));
        registry.register(EntityType::Zone, "cloud", Arc::new(Named("pair")));
        registry.register_type("cloud", Arc::new(Named("type")));
        registry.register_type("edge", Arc::new(Named("edge")));

        let cloud = Specification::new("", "cloud");
        assert_eq!(resolved(&registry, cloud.clone().with_function("provision")), "function");
        assert_eq!(resolved(&registry, cloud.clone().with_function("unknown")), "pair");
        assert_eq!(resolved(&registry, cloud), "pair");
        assert_eq!(resolved(&registry, Specification::new("", "edge")), "edge");
        assert_eq!(resolved(&registry, Specification::new("", "other")), "pass-through");
    }

    #[test]
    fn required_handler_has_no_fallback() {
        let mut registry = HandlerRegistry::new();
        registry.set_require_handler(true);
        let err = registry
            .resolve(&zone(Specification::new("", "cloud")))
            .err()
            .unwrap();
        assert!(matches!(err, HandlerError::NoHandler { entity_type: EntityType::Zone, .. }));
    }

    #[test]
    fn config_registers_defaults_per_type() {
        let config = HandlerConfig {
            require_handler: true,
            defaults: [(
                "cloud".to_string(),
                json!({"region": "eu-west-1"}).as_object().cloned().unwrap(),
            )]
            .into(),
        };
        let registry = HandlerRegistry::from_config(&config);
        assert_eq!(resolved(&registry, Specification::new("", "cloud")), "cloud-defaults");
        assert!(registry.resolve(&zone(Specification::new("", "edge"))).is_err());
    }

    #[tokio::test]
    async fn service_invokes_the_resolved_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_type("blocked", Arc::new(Veto));
        registry.register_type(
            "cloud",
            Arc::new(ConfigurationDefaultsHandler::new(
                "cloud-defaults",
                json!({"region": "eu-west-1"}).as_object().cloned().unwrap(),
            )),
        );
        let service = HandlerService::new(Arc::new(registry));

        let spec = service
            .handle_insert(&Zone::new(ZoneKey::new("aws"), Specification::new("", "cloud")))
            .await
            .unwrap();
        assert_eq!(spec.configuration, json!({"region": "eu-west-1"}));

        let blocked = Zone::new(ZoneKey::new("aws"), Specification::new("", "blocked"));
        assert!(matches!(
            service.handle_insert(&blocked).await,
            Err(HandlerError::Rejected { .. })
        ));
        assert!(service.handle_delete(&blocked).await.is_ok());
    }
}
