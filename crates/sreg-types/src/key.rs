use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters that carry meaning in the display form of a [`Key`] and are
/// therefore not allowed inside key names.
pub const RESERVED_KEY_CHARS: &[char] = &[':', '/', '[', ']', ',', '@'];

/// Tag naming the kind of entity a [`Key`] identifies.
///
/// Each entity type owns its own partition of the log and its own
/// materialized view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Domain,
    Schema,
    Stream,
    Zone,
    Infrastructure,
    Producer,
    Consumer,
    StreamBinding,
    ProducerBinding,
    ConsumerBinding,
    ProcessBinding,
}

impl EntityType {
    /// Every entity type, in dependency order (referenced types first).
    pub const ALL: [EntityType; 11] = [
        Self::Domain,
        Self::Schema,
        Self::Stream,
        Self::Zone,
        Self::Infrastructure,
        Self::Producer,
        Self::Consumer,
        Self::StreamBinding,
        Self::ProducerBinding,
        Self::ConsumerBinding,
        Self::ProcessBinding,
    ];

    /// The stable wire/display tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Schema => "schema",
            Self::Stream => "stream",
            Self::Zone => "zone",
            Self::Infrastructure => "infrastructure",
            Self::Producer => "producer",
            Self::Consumer => "consumer",
            Self::StreamBinding => "stream_binding",
            Self::ProducerBinding => "producer_binding",
            Self::ConsumerBinding => "consumer_binding",
            Self::ProcessBinding => "process_binding",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypeError::UnknownEntityType(s.to_string()))
    }
}

/// Hierarchical composite identifier of an entity.
///
/// A key is an entity-type tag, the ordered keys of its ancestors, a local
/// name, and an optional version. Equality, ordering and hashing are all
/// structural, so two keys built from the same parts are the same key.
///
/// The display form nests parents in brackets:
///
/// ```text
/// producer:[stream:[domain:acme]/orders@1,zone:aws-us-east]/checkout
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parents: Vec<Key>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
}

impl Key {
    /// A root key with no ancestors.
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            parents: Vec::new(),
            name: name.into(),
            version: None,
        }
    }

    /// Append an ancestor key. Ancestors keep their insertion order.
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn parents(&self) -> &[Key] {
        &self.parents
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// The first direct parent of the given entity type, if any.
    pub fn parent(&self, entity_type: EntityType) -> Option<&Key> {
        self.parents.iter().find(|p| p.entity_type == entity_type)
    }

    /// The direct parent of the given type, or a decode error naming it.
    pub fn require_parent(&self, entity_type: EntityType) -> Result<&Key, TypeError> {
        self.parent(entity_type).ok_or_else(|| TypeError::InvalidKey {
            key: self.to_string(),
            reason: format!("missing {entity_type} parent"),
        })
    }

    /// Returns `true` if `ancestor` appears anywhere above this key.
    pub fn has_ancestor(&self, ancestor: &Key) -> bool {
        self.parents
            .iter()
            .any(|p| p == ancestor || p.has_ancestor(ancestor))
    }

    /// Fail with [`TypeError::KeyTypeMismatch`] unless this key has the
    /// expected entity type.
    pub fn expect_type(&self, expected: EntityType) -> Result<(), TypeError> {
        if self.entity_type == expected {
            Ok(())
        } else {
            Err(TypeError::KeyTypeMismatch {
                expected,
                actual: self.entity_type,
            })
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.entity_type)?;
        if !self.parents.is_empty() {
            f.write_str("[")?;
            for (i, parent) in self.parents.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{parent}")?;
            }
            f.write_str("]/")?;
        }
        f.write_str(&self.name)?;
        if let Some(version) = self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_key() -> Key {
        Key::new(EntityType::Stream, "orders")
            .with_parent(Key::new(EntityType::Domain, "acme"))
            .with_version(1)
    }

    #[test]
    fn display_nests_parents() {
        let producer = Key::new(EntityType::Producer, "checkout")
            .with_parent(stream_key())
            .with_parent(Key::new(EntityType::Zone, "aws"));
        assert_eq!(
            producer.to_string(),
            "producer:[stream:[domain:acme]/orders@1,zone:aws]/checkout"
        );
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(stream_key(), stream_key());
        assert_ne!(stream_key(), stream_key().with_version(2));
    }

    #[test]
    fn has_ancestor_walks_the_hierarchy() {
        let domain = Key::new(EntityType::Domain, "acme");
        let producer = Key::new(EntityType::Producer, "p").with_parent(stream_key());
        assert!(producer.has_ancestor(&stream_key()));
        assert!(producer.has_ancestor(&domain));
        assert!(!domain.has_ancestor(&producer));
    }

    #[test]
    fn entity_type_parses_its_own_tag() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert_eq!(
            "widget".parse::<EntityType>().unwrap_err(),
            TypeError::UnknownEntityType("widget".into())
        );
    }

    #[test]
    fn wire_encoding_omits_empty_parts() {
        let json = serde_json::to_value(Key::new(EntityType::Zone, "aws")).unwrap();
        assert_eq!(json, serde_json::json!({"entityType": "zone", "name": "aws"}));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn name() -> impl Strategy<Value = String> {
            "[a-z][a-z0-9-]{0,12}"
        }

        proptest! {
            #[test]
            fn parent_is_always_an_ancestor(
                domain in name(),
                stream in name(),
                producer in name(),
                version in 1u32..1000,
            ) {
                let domain = Key::new(EntityType::Domain, domain);
                let stream = Key::new(EntityType::Stream, stream)
                    .with_parent(domain.clone())
                    .with_version(version);
                let producer = Key::new(EntityType::Producer, producer).with_parent(stream.clone());

                prop_assert!(producer.has_ancestor(&stream));
                prop_assert!(producer.has_ancestor(&domain));
                prop_assert!(!stream.has_ancestor(&producer));
                prop_assert_eq!(producer.parent(EntityType::Stream), Some(&stream));
                let display = producer.to_string();
                let expected_suffix = format!("@{version}]/");
                prop_assert!(display.contains(&expected_suffix));
            }
        }
    }
}
