use sreg_log::PositionedRecord;
use sreg_types::EntityType;

use crate::error::Result;
use crate::set::ViewSet;
use crate::view::EntityView;

/// Fold `records` into a fresh, detached view of `entity_type`.
///
/// Records of other types are ignored. The result depends only on the
/// records and their positions, never on how they were delivered.
pub fn replay(entity_type: EntityType, records: &[PositionedRecord]) -> Result<EntityView> {
    let view = EntityView::new(entity_type);
    for record in records
        .iter()
        .filter(|r| r.record.entity_type() == entity_type)
    {
        view.apply(record)?;
    }
    Ok(view)
}

/// Fold `records` into a fresh set of views covering every entity type.
pub fn replay_all(records: &[PositionedRecord]) -> Result<ViewSet> {
    let views = ViewSet::new();
    for record in records {
        views.apply(record)?;
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use sreg_log::LogRecord;
    use sreg_types::{Entity, Key, Specification};

    use super::*;

    fn record(position: u64, name: u8, upsert: Option<u8>) -> PositionedRecord {
        let key = Key::new(EntityType::Zone, format!("z{name}"));
        let record = match upsert {
            Some(rev) => LogRecord::upsert(Entity {
                key,
                specification: Specification::new(format!("rev {rev}"), "cloud"),
                links: Default::default(),
                status: None,
            }),
            None => LogRecord::tombstone(key),
        };
        PositionedRecord { position, record }
    }

    fn ops() -> impl Strategy<Value = Vec<(u8, Option<u8>)>> {
        prop::collection::vec((0u8..4, prop::option::of(0u8..8)), 0..40)
    }

    fn positioned(ops: &[(u8, Option<u8>)]) -> Vec<PositionedRecord> {
        ops.iter()
            .enumerate()
            .map(|(i, (name, rev))| record(i as u64, *name, *rev))
            .collect()
    }

    proptest! {
        #[test]
        fn replay_is_deterministic(ops in ops()) {
            let records = positioned(&ops);
            let a = replay(EntityType::Zone, &records).unwrap();
            let b = replay(EntityType::Zone, &records).unwrap();
            prop_assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        }

        #[test]
        fn redelivery_does_not_change_the_fold(ops in ops(), cut in 0usize..40) {
            let records = positioned(&ops);
            let view = replay(EntityType::Zone, &records).unwrap();
            let before = view.digest().unwrap();
            for r in records.iter().take(cut.min(records.len())) {
                view.apply(r).unwrap();
            }
            prop_assert_eq!(view.digest().unwrap(), before);
        }

        #[test]
        fn last_writer_wins_per_key(ops in ops()) {
            let mut expected: HashMap<u8, u8> = HashMap::new();
            for (name, rev) in &ops {
                match rev {
                    Some(rev) => { expected.insert(*name, *rev); }
                    None => { expected.remove(name); }
                }
            }

            let view = replay(EntityType::Zone, &positioned(&ops)).unwrap();
            prop_assert_eq!(view.len().unwrap(), expected.len());
            for (name, rev) in expected {
                let key = Key::new(EntityType::Zone, format!("z{name}"));
                let entity = view.get(&key).unwrap().unwrap();
                prop_assert_eq!(entity.specification.description, format!("rev {rev}"));
            }
        }
    }

    #[test]
    fn replay_ignores_other_types() {
        let mut records = positioned(&[(0, Some(1))]);
        records.push(PositionedRecord {
            position: 1,
            record: LogRecord::tombstone(Key::new(EntityType::Domain, "acme")),
        });
        let view = replay(EntityType::Zone, &records).unwrap();
        assert_eq!(view.len().unwrap(), 1);
        assert_eq!(replay_all(&records).unwrap().view(EntityType::Zone).len().unwrap(), 1);
    }
}
