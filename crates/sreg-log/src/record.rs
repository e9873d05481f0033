use serde::{Deserialize, Serialize};

use sreg_types::{Entity, EntityType, Key};

use crate::error::{LogError, Result};

/// Zero-based offset of a record in the log.
pub type LogPosition = u64;

/// The kind of change a record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Upsert,
    Tombstone,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upsert => f.write_str("upsert"),
            Self::Tombstone => f.write_str("tombstone"),
        }
    }
}

/// The change applied to a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Set the key to this entity.
    Upsert(Entity),
    /// Remove the key.
    Tombstone,
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Upsert(_) => Operation::Upsert,
            Self::Tombstone => Operation::Tombstone,
        }
    }
}

/// One mutation event, as appended to the log.
///
/// Wire shape:
/// ```text
/// { "entityType": "...", "key": {...}, "operation": "upsert"|"tombstone", "payload": {...}? }
/// ```
///
/// The payload is present only for upserts. Decoding rejects records whose
/// parts disagree (a tombstone with a payload, a payload for another key,
/// an entity type that does not match the key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub struct LogRecord {
    key: Key,
    mutation: Mutation,
}

impl LogRecord {
    /// An upsert of `entity` under its own key.
    pub fn upsert(entity: Entity) -> Self {
        Self {
            key: entity.key.clone(),
            mutation: Mutation::Upsert(entity),
        }
    }

    pub fn tombstone(key: Key) -> Self {
        Self {
            key,
            mutation: Mutation::Tombstone,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn entity_type(&self) -> EntityType {
        self.key.entity_type()
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub fn operation(&self) -> Operation {
        self.mutation.operation()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A record together with the position the log assigned it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionedRecord {
    pub position: LogPosition,
    pub record: LogRecord,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    entity_type: EntityType,
    key: Key,
    operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Entity>,
}

impl From<LogRecord> for WireRecord {
    fn from(record: LogRecord) -> Self {
        let (operation, payload) = match record.mutation {
            Mutation::Upsert(entity) => (Operation::Upsert, Some(entity)),
            Mutation::Tombstone => (Operation::Tombstone, None),
        };
        Self {
            entity_type: record.key.entity_type(),
            key: record.key,
            operation,
            payload,
        }
    }
}

impl TryFrom<WireRecord> for LogRecord {
    type Error = LogError;

    fn try_from(wire: WireRecord) -> Result<Self> {
        if wire.entity_type != wire.key.entity_type() {
            return Err(LogError::InvalidRecord(format!(
                "entity type {} does not match key {}",
                wire.entity_type, wire.key
            )));
        }
        let mutation = match (wire.operation, wire.payload) {
            (Operation::Upsert, Some(entity)) => {
                if entity.key != wire.key {
                    return Err(LogError::InvalidRecord(format!(
                        "payload key {} does not match record key {}",
                        entity.key, wire.key
                    )));
                }
                Mutation::Upsert(entity)
            }
            (Operation::Tombstone, None) => Mutation::Tombstone,
            (Operation::Upsert, None) => {
                return Err(LogError::InvalidRecord("upsert without payload".into()))
            }
            (Operation::Tombstone, Some(_)) => {
                return Err(LogError::InvalidRecord("tombstone with payload".into()))
            }
        };
        Ok(Self {
            key: wire.key,
            mutation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sreg_types::Specification;

    fn zone(name: &str) -> Entity {
        Entity {
            key: Key::new(EntityType::Zone, name),
            specification: Specification::new("", "cloud"),
            links: Default::default(),
            status: None,
        }
    }

    #[test]
    fn tombstone_wire_shape_has_no_payload() {
        let record = LogRecord::tombstone(Key::new(EntityType::Zone, "aws"));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "entityType": "zone",
                "key": {"entityType": "zone", "name": "aws"},
                "operation": "tombstone"
            })
        );
    }

    #[test]
    fn upsert_survives_the_byte_encoding() {
        let record = LogRecord::upsert(zone("aws"));
        let decoded = LogRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.operation(), Operation::Upsert);
    }

    #[test]
    fn inconsistent_records_are_rejected() {
        let key = json!({"entityType": "zone", "name": "aws"});
        let bad = [
            json!({"entityType": "zone", "key": key, "operation": "upsert"}),
            json!({
                "entityType": "zone", "key": key, "operation": "tombstone",
                "payload": serde_json::to_value(zone("aws")).unwrap()
            }),
            json!({"entityType": "domain", "key": key, "operation": "tombstone"}),
            json!({
                "entityType": "zone", "key": key, "operation": "upsert",
                "payload": serde_json::to_value(zone("gcp")).unwrap()
            }),
        ];
        for value in bad {
            let bytes = serde_json::to_vec(&value).unwrap();
            assert!(LogRecord::from_bytes(&bytes).is_err(), "accepted {value}");
        }
    }
}
