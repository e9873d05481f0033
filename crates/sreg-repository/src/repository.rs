use std::sync::Arc;

use tracing::warn;

use sreg_log::EventSender;
use sreg_types::{Model, ModelKey};
use sreg_view::EntityView;

use crate::converter::{Converter, ModelConverter};
use crate::error::RepositoryResult;

/// Save/delete/read orchestration for one entity type.
///
/// Writes go through the [`EventSender`] and become visible once the view
/// has folded them; reads come from the view. A save returns the model it
/// was given, not a re-read.
pub struct Repository<M, C = ModelConverter<M>> {
    converter: C,
    sender: EventSender,
    view: Arc<EntityView>,
    _model: std::marker::PhantomData<fn() -> M>,
}

impl<M: Model> Repository<M> {
    pub fn new(sender: EventSender, view: Arc<EntityView>) -> Self {
        Self::with_converter(ModelConverter::new(), sender, view)
    }
}

impl<M, C> Repository<M, C>
where
    M: Model,
    C: Converter<Model = M>,
{
    pub fn with_converter(converter: C, sender: EventSender, view: Arc<EntityView>) -> Self {
        Self {
            converter,
            sender,
            view,
            _model: std::marker::PhantomData,
        }
    }

    pub fn view(&self) -> &Arc<EntityView> {
        &self.view
    }

    /// Append an upsert of `model` and echo it back.
    pub async fn save(&self, model: &M) -> RepositoryResult<M> {
        let entity = self.converter.to_wire(model)?;
        self.sender.upsert(entity).await?;
        Ok(model.clone())
    }

    /// Append a tombstone for `model`'s key.
    pub async fn delete(&self, model: &M) -> RepositoryResult<()> {
        self.sender.tombstone(model.key().to_key()).await?;
        Ok(())
    }

    pub async fn get(&self, key: &M::Key) -> RepositoryResult<Option<M>> {
        match self.view.get(&key.to_key())? {
            Some(entity) => Ok(Some(self.converter.from_wire(&entity)?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, key: &M::Key) -> RepositoryResult<bool> {
        Ok(self.view.exists(&key.to_key())?)
    }

    /// Every model in the current snapshot that matches `predicate`, in key
    /// order. Wire entities that fail conversion are skipped.
    pub async fn find_all<P>(&self, predicate: P) -> RepositoryResult<Vec<M>>
    where
        P: Fn(&M) -> bool,
    {
        let scan = self.view.find_all(|_| true)?;
        let mut models = Vec::new();
        for entity in scan.iter() {
            match self.converter.from_wire(entity) {
                Ok(model) if predicate(&model) => models.push(model),
                Ok(_) => {}
                Err(err) => {
                    warn!(key = %entity.key, error = %err, "skipping unconvertible entity");
                }
            }
        }
        Ok(models)
    }
}
