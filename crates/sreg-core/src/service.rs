use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sreg_gate::ValidatorChain;
use sreg_handlers::HandlerService;
use sreg_repository::Repository;
use sreg_types::{EntityType, Key, Model, ModelKey, Status};

use crate::error::{ServiceError, ServiceResult};

/// Something that can delete the entities of one type that reference a
/// given key. Parent services cascade through this.
#[async_trait]
pub trait DependentService: Send + Sync {
    fn entity_type(&self) -> EntityType;

    /// Snapshot the entities referencing `parent` and delete each one,
    /// cascading further. Keys already in `visited` are skipped. Returns the
    /// number of entities this call deleted directly.
    async fn delete_dependents_of(
        &self,
        parent: &Key,
        visited: &mut HashSet<Key>,
    ) -> ServiceResult<usize>;
}

/// Validate, run the handler, persist, cascade: the mutation pipeline for
/// one entity type.
pub struct EntityService<M: Model> {
    repository: Repository<M>,
    validator: Arc<ValidatorChain>,
    handlers: HandlerService,
    dependents: Vec<Arc<dyn DependentService>>,
}

impl<M: Model> EntityService<M> {
    pub fn new(
        repository: Repository<M>,
        validator: Arc<ValidatorChain>,
        handlers: HandlerService,
    ) -> Self {
        Self {
            repository,
            validator,
            handlers,
            dependents: Vec::new(),
        }
    }

    /// Delete entities of `dependent`'s type that reference ours before we
    /// delete our own.
    pub fn with_dependent(mut self, dependent: Arc<dyn DependentService>) -> Self {
        self.dependents.push(dependent);
        self
    }

    pub fn dependent_types(&self) -> Vec<EntityType> {
        self.dependents.iter().map(|d| d.entity_type()).collect()
    }

    pub fn repository(&self) -> &Repository<M> {
        &self.repository
    }

    pub async fn create(&self, model: &M) -> ServiceResult<M> {
        let key = model.key().to_key();
        if self.repository.exists(model.key()).await? {
            return Err(ServiceError::AlreadyExists(key));
        }
        self.validator.validate_for_create(model)?.into_result()?;

        let specification = self.handlers.handle_insert(model).await?;
        let mut accepted = model.clone();
        accepted.set_specification(specification);

        let saved = self.repository.save(&accepted).await?;
        info!(%key, "entity created");
        Ok(saved)
    }

    /// Replace the specification (and links) of an existing entity. The
    /// stored status is always kept: any status on the candidate is
    /// ignored, and only [`update_status`](Self::update_status) changes it.
    pub async fn update(&self, model: &M) -> ServiceResult<M> {
        let existing = self.require(model.key()).await?;
        self.validator
            .validate_for_update(model, &existing)?
            .into_result()?;

        let specification = self.handlers.handle_update(model, &existing).await?;
        let accepted = M::from_parts(
            model.key().clone(),
            specification,
            existing.status().cloned(),
            &model.links(),
        )?;

        let saved = self.repository.save(&accepted).await?;
        info!(key = %model.key().to_key(), "entity updated");
        Ok(saved)
    }

    /// Set the status of an existing entity. Skips validation and handlers.
    pub async fn update_status(&self, key: &M::Key, status: Status) -> ServiceResult<M> {
        let mut model = self.require(key).await?;
        model.set_status(status);
        let saved = self.repository.save(&model).await?;
        debug!(key = %key.to_key(), "status updated");
        Ok(saved)
    }

    /// Delete `model` and, first, everything that references it.
    pub async fn delete(&self, model: &M) -> ServiceResult<()> {
        let mut visited = HashSet::new();
        self.delete_cascading(model, &mut visited).await
    }

    pub async fn delete_key(&self, key: &M::Key) -> ServiceResult<()> {
        let model = self.require(key).await?;
        self.delete(&model).await
    }

    pub async fn get(&self, key: &M::Key) -> ServiceResult<Option<M>> {
        Ok(self.repository.get(key).await?)
    }

    pub async fn find_all<P>(&self, predicate: P) -> ServiceResult<Vec<M>>
    where
        P: Fn(&M) -> bool + Send,
    {
        Ok(self.repository.find_all(predicate).await?)
    }

    async fn require(&self, key: &M::Key) -> ServiceResult<M> {
        self.repository
            .get(key)
            .await?
            .ok_or_else(|| ServiceError::NotFound(key.to_key()))
    }

    async fn delete_cascading(&self, model: &M, visited: &mut HashSet<Key>) -> ServiceResult<()> {
        let key = model.key().to_key();
        if !visited.insert(key.clone()) {
            return Ok(());
        }

        if let Err(err) = self.handlers.handle_delete(model).await {
            warn!(%key, error = %err, "delete handler failed, deleting anyway");
        }

        for dependent in &self.dependents {
            let deleted = dependent.delete_dependents_of(&key, visited).await?;
            if deleted > 0 {
                debug!(%key, dependent = %dependent.entity_type(), deleted, "cascaded");
            }
        }

        self.repository.delete(model).await?;
        info!(%key, "entity deleted");
        Ok(())
    }
}

#[async_trait]
impl<M: Model> DependentService for EntityService<M> {
    fn entity_type(&self) -> EntityType {
        M::ENTITY_TYPE
    }

    async fn delete_dependents_of(
        &self,
        parent: &Key,
        visited: &mut HashSet<Key>,
    ) -> ServiceResult<usize> {
        let dependents = self
            .repository
            .find_all(|model: &M| model.depends_on(parent))
            .await?;

        let mut deleted = 0;
        for model in &dependents {
            if visited.contains(&model.key().to_key()) {
                continue;
            }
            self.delete_cascading(model, visited).await?;
            deleted += 1;
        }
        Ok(deleted)
    }
}
