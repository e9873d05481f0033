use std::sync::Arc;

use sreg_log::PositionedRecord;
use sreg_types::{Entity, EntityType, Key};

use crate::error::Result;
use crate::view::EntityView;

/// One [`EntityView`] per entity type.
///
/// Lookups and folds are routed by the key's entity type, so callers that
/// only hold a [`Key`] (referential checks, the CLI) need not know which
/// view it lives in.
pub struct ViewSet {
    views: Vec<Arc<EntityView>>,
}

impl ViewSet {
    pub fn new() -> Self {
        Self {
            views: EntityType::ALL
                .iter()
                .map(|t| Arc::new(EntityView::new(*t)))
                .collect(),
        }
    }

    pub fn view(&self, entity_type: EntityType) -> &Arc<EntityView> {
        // `ALL` lists the variants in declaration order.
        &self.views[entity_type as usize]
    }

    pub fn get(&self, key: &Key) -> Result<Option<Entity>> {
        self.view(key.entity_type()).get(key)
    }

    pub fn exists(&self, key: &Key) -> Result<bool> {
        self.view(key.entity_type()).exists(key)
    }

    /// Route a record to the view of its entity type.
    pub fn apply(&self, record: &PositionedRecord) -> Result<bool> {
        self.view(record.record.entity_type()).apply(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityView>> {
        self.views.iter()
    }

    /// Digest of every view, in entity-type order.
    pub fn digest(&self) -> Result<String> {
        let mut hasher = blake3::Hasher::new();
        for view in &self.views {
            hasher.update(view.entity_type().as_str().as_bytes());
            hasher.update(view.digest()?.as_bytes());
        }
        Ok(hasher.finalize().to_hex().to_string())
    }
}

impl Default for ViewSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sreg_log::LogRecord;
    use sreg_types::Specification;

    #[test]
    fn views_are_indexed_by_their_own_type() {
        let views = ViewSet::new();
        for t in EntityType::ALL {
            assert_eq!(views.view(t).entity_type(), t);
        }
    }

    #[test]
    fn records_route_to_their_view() {
        let views = ViewSet::new();
        let key = Key::new(EntityType::Domain, "acme");
        let record = PositionedRecord {
            position: 0,
            record: LogRecord::upsert(Entity {
                key: key.clone(),
                specification: Specification::new("", "default"),
                links: Default::default(),
                status: None,
            }),
        };
        assert!(views.apply(&record).unwrap());
        assert!(views.exists(&key).unwrap());
        assert!(views.view(EntityType::Zone).is_empty().unwrap());
    }
}
