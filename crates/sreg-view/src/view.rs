use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use sreg_log::{LogPosition, Mutation, PositionedRecord};
use sreg_types::{Entity, EntityType, Key};

use crate::error::{Result, ViewError};

type Entries = BTreeMap<Key, Entity>;

struct ViewState {
    entries: Arc<Entries>,
    applied: Option<LogPosition>,
}

/// The materialized state of one entity type.
///
/// Folds log records strictly in position order: an upsert sets the key,
/// a tombstone removes it. The map lives behind an `Arc`; readers clone the
/// `Arc` and never observe a half-applied record, and the writer copies the
/// map only while a reader still holds the previous snapshot.
///
/// A record at or below the last applied position is ignored, so
/// redelivering a batch is harmless.
pub struct EntityView {
    entity_type: EntityType,
    state: RwLock<ViewState>,
}

impl EntityView {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            state: RwLock::new(ViewState {
                entries: Arc::new(BTreeMap::new()),
                applied: None,
            }),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// The current map, frozen at the moment of the call.
    pub fn snapshot(&self) -> Result<Arc<BTreeMap<Key, Entity>>> {
        let state = self.state.read().map_err(|_| ViewError::LockPoisoned)?;
        Ok(Arc::clone(&state.entries))
    }

    pub fn get(&self, key: &Key) -> Result<Option<Entity>> {
        Ok(self.snapshot()?.get(key).cloned())
    }

    pub fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.snapshot()?.contains_key(key))
    }

    /// A lazy scan over the entities matching `predicate`.
    ///
    /// The scan is bound to the snapshot taken here; later folds do not
    /// affect it and it can be iterated any number of times.
    pub fn find_all<P>(&self, predicate: P) -> Result<Scan<P>>
    where
        P: Fn(&Entity) -> bool,
    {
        Ok(Scan {
            snapshot: self.snapshot()?,
            predicate,
        })
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.snapshot()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Last log position folded into this view.
    pub fn position(&self) -> Result<Option<LogPosition>> {
        let state = self.state.read().map_err(|_| ViewError::LockPoisoned)?;
        Ok(state.applied)
    }

    /// Fold one record. Returns `false` if the record was already applied.
    pub fn apply(&self, positioned: &PositionedRecord) -> Result<bool> {
        let record = &positioned.record;
        if record.entity_type() != self.entity_type {
            return Err(ViewError::WrongEntityType {
                expected: self.entity_type,
                actual: record.entity_type(),
            });
        }

        let mut state = self.state.write().map_err(|_| ViewError::LockPoisoned)?;
        if state
            .applied
            .is_some_and(|applied| positioned.position <= applied)
        {
            return Ok(false);
        }

        let entries = Arc::make_mut(&mut state.entries);
        match record.mutation() {
            Mutation::Upsert(entity) => {
                entries.insert(record.key().clone(), entity.clone());
            }
            Mutation::Tombstone => {
                entries.remove(record.key());
            }
        }
        state.applied = Some(positioned.position);

        debug!(
            entity_type = %self.entity_type,
            position = positioned.position,
            key = %record.key(),
            operation = %record.operation(),
            "record folded"
        );
        Ok(true)
    }

    /// BLAKE3 digest of the canonical JSON of every entity, in key order.
    pub fn digest(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        let entities: Vec<&Entity> = snapshot.values().collect();
        let encoded =
            serde_json::to_vec(&entities).map_err(|e| ViewError::Serialization(e.to_string()))?;
        Ok(hex::encode(blake3::hash(&encoded).as_bytes()))
    }
}

/// A finite, restartable scan over one view snapshot.
pub struct Scan<P> {
    snapshot: Arc<Entries>,
    predicate: P,
}

impl<P> Scan<P>
where
    P: Fn(&Entity) -> bool,
{
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.snapshot.values().filter(move |e| (self.predicate)(*e))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sreg_log::LogRecord;
    use sreg_types::Specification;

    fn zone(name: &str, description: &str) -> Entity {
        Entity {
            key: Key::new(EntityType::Zone, name),
            specification: Specification::new(description, "cloud"),
            links: Default::default(),
            status: None,
        }
    }

    fn at(position: LogPosition, record: LogRecord) -> PositionedRecord {
        PositionedRecord { position, record }
    }

    #[test]
    fn later_upsert_wins_and_tombstone_removes() {
        let view = EntityView::new(EntityType::Zone);
        view.apply(&at(0, LogRecord::upsert(zone("aws", "v1")))).unwrap();
        view.apply(&at(1, LogRecord::upsert(zone("aws", "v2")))).unwrap();

        let key = Key::new(EntityType::Zone, "aws");
        assert_eq!(view.get(&key).unwrap().unwrap().specification.description, "v2");

        view.apply(&at(2, LogRecord::tombstone(key.clone()))).unwrap();
        assert!(!view.exists(&key).unwrap());
        assert_eq!(view.position().unwrap(), Some(2));
    }

    #[test]
    fn redelivered_records_are_skipped() {
        let view = EntityView::new(EntityType::Zone);
        assert!(view.apply(&at(4, LogRecord::upsert(zone("aws", "new")))).unwrap());
        assert!(!view.apply(&at(3, LogRecord::upsert(zone("aws", "old")))).unwrap());
        assert!(!view.apply(&at(4, LogRecord::upsert(zone("aws", "old")))).unwrap());

        let key = Key::new(EntityType::Zone, "aws");
        assert_eq!(view.get(&key).unwrap().unwrap().specification.description, "new");
    }

    #[test]
    fn records_of_another_type_are_refused() {
        let view = EntityView::new(EntityType::Domain);
        let err = view
            .apply(&at(0, LogRecord::upsert(zone("aws", ""))))
            .unwrap_err();
        assert!(matches!(err, ViewError::WrongEntityType { .. }));
    }

    #[test]
    fn scan_keeps_its_snapshot_across_folds() {
        let view = EntityView::new(EntityType::Zone);
        view.apply(&at(0, LogRecord::upsert(zone("aws", "")))).unwrap();
        view.apply(&at(1, LogRecord::upsert(zone("gcp", "")))).unwrap();

        let scan = view.find_all(|e| e.key.name() != "gcp").unwrap();
        view.apply(&at(2, LogRecord::upsert(zone("azure", "")))).unwrap();
        view.apply(&at(3, LogRecord::tombstone(Key::new(EntityType::Zone, "aws"))))
            .unwrap();

        let names: Vec<_> = scan.iter().map(|e| e.key.name().to_string()).collect();
        assert_eq!(names, ["aws"]);
        // Restartable: a second pass yields the same result.
        assert_eq!(scan.count(), 1);
        assert_eq!(view.len().unwrap(), 2);
    }

    #[test]
    fn digest_tracks_content_not_history() {
        let a = EntityView::new(EntityType::Zone);
        a.apply(&at(0, LogRecord::upsert(zone("aws", "x")))).unwrap();

        let b = EntityView::new(EntityType::Zone);
        b.apply(&at(0, LogRecord::upsert(zone("aws", "y")))).unwrap();
        b.apply(&at(7, LogRecord::upsert(zone("aws", "x")))).unwrap();

        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_ne!(a.digest().unwrap(), EntityView::new(EntityType::Zone).digest().unwrap());
    }
}
