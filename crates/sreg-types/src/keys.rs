//! Typed keys for every entity in the registry.
//!
//! Each typed key maps onto a hierarchical [`Key`]; parents become key
//! ancestors in a fixed order so the encoding is canonical.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::key::{EntityType, Key};
use crate::model::ModelKey;

fn invalid(key: &Key, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainKey {
    pub name: String,
}

impl DomainKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ModelKey for DomainKey {
    const ENTITY_TYPE: EntityType = EntityType::Domain;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name)
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        Ok(Self::new(key.name()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaKey {
    pub domain: DomainKey,
    pub name: String,
}

impl SchemaKey {
    pub fn new(domain: DomainKey, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }
}

impl ModelKey for SchemaKey {
    const ENTITY_TYPE: EntityType = EntityType::Schema;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name).with_parent(self.domain.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let domain = DomainKey::from_key(key.require_parent(EntityType::Domain)?)?;
        Ok(Self::new(domain, key.name()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamKey {
    pub domain: DomainKey,
    pub name: String,
    pub version: u32,
}

impl StreamKey {
    pub fn new(domain: DomainKey, name: impl Into<String>, version: u32) -> Self {
        Self {
            domain,
            name: name.into(),
            version,
        }
    }
}

impl ModelKey for StreamKey {
    const ENTITY_TYPE: EntityType = EntityType::Stream;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name)
            .with_parent(self.domain.to_key())
            .with_version(self.version)
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let domain = DomainKey::from_key(key.require_parent(EntityType::Domain)?)?;
        let version = key
            .version()
            .ok_or_else(|| invalid(key, "stream keys must carry a version"))?;
        Ok(Self::new(domain, key.name(), version))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneKey {
    pub name: String,
}

impl ZoneKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ModelKey for ZoneKey {
    const ENTITY_TYPE: EntityType = EntityType::Zone;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name)
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        Ok(Self::new(key.name()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfrastructureKey {
    pub zone: ZoneKey,
    pub name: String,
}

impl InfrastructureKey {
    pub fn new(zone: ZoneKey, name: impl Into<String>) -> Self {
        Self {
            zone,
            name: name.into(),
        }
    }
}

impl ModelKey for InfrastructureKey {
    const ENTITY_TYPE: EntityType = EntityType::Infrastructure;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name).with_parent(self.zone.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let zone = ZoneKey::from_key(key.require_parent(EntityType::Zone)?)?;
        Ok(Self::new(zone, key.name()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerKey {
    pub stream: StreamKey,
    pub zone: ZoneKey,
    pub name: String,
}

impl ProducerKey {
    pub fn new(stream: StreamKey, zone: ZoneKey, name: impl Into<String>) -> Self {
        Self {
            stream,
            zone,
            name: name.into(),
        }
    }
}

impl ModelKey for ProducerKey {
    const ENTITY_TYPE: EntityType = EntityType::Producer;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name)
            .with_parent(self.stream.to_key())
            .with_parent(self.zone.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let stream = StreamKey::from_key(key.require_parent(EntityType::Stream)?)?;
        let zone = ZoneKey::from_key(key.require_parent(EntityType::Zone)?)?;
        Ok(Self::new(stream, zone, key.name()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumerKey {
    pub stream: StreamKey,
    pub zone: ZoneKey,
    pub name: String,
}

impl ConsumerKey {
    pub fn new(stream: StreamKey, zone: ZoneKey, name: impl Into<String>) -> Self {
        Self {
            stream,
            zone,
            name: name.into(),
        }
    }
}

impl ModelKey for ConsumerKey {
    const ENTITY_TYPE: EntityType = EntityType::Consumer;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name)
            .with_parent(self.stream.to_key())
            .with_parent(self.zone.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let stream = StreamKey::from_key(key.require_parent(EntityType::Stream)?)?;
        let zone = ZoneKey::from_key(key.require_parent(EntityType::Zone)?)?;
        Ok(Self::new(stream, zone, key.name()))
    }
}

/// A stream materialized on one piece of infrastructure.
///
/// The local name of the encoded key repeats the infrastructure name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamBindingKey {
    pub stream: StreamKey,
    pub infrastructure: InfrastructureKey,
}

impl StreamBindingKey {
    pub fn new(stream: StreamKey, infrastructure: InfrastructureKey) -> Self {
        Self {
            stream,
            infrastructure,
        }
    }
}

impl ModelKey for StreamBindingKey {
    const ENTITY_TYPE: EntityType = EntityType::StreamBinding;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.infrastructure.name)
            .with_parent(self.stream.to_key())
            .with_parent(self.infrastructure.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let stream = StreamKey::from_key(key.require_parent(EntityType::Stream)?)?;
        let infrastructure =
            InfrastructureKey::from_key(key.require_parent(EntityType::Infrastructure)?)?;
        Ok(Self::new(stream, infrastructure))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerBindingKey {
    pub producer: ProducerKey,
    pub infrastructure: InfrastructureKey,
}

impl ProducerBindingKey {
    pub fn new(producer: ProducerKey, infrastructure: InfrastructureKey) -> Self {
        Self {
            producer,
            infrastructure,
        }
    }

    /// The stream binding this producer binding publishes through.
    pub fn stream_binding(&self) -> StreamBindingKey {
        StreamBindingKey::new(self.producer.stream.clone(), self.infrastructure.clone())
    }
}

impl ModelKey for ProducerBindingKey {
    const ENTITY_TYPE: EntityType = EntityType::ProducerBinding;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.infrastructure.name)
            .with_parent(self.producer.to_key())
            .with_parent(self.infrastructure.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let producer = ProducerKey::from_key(key.require_parent(EntityType::Producer)?)?;
        let infrastructure =
            InfrastructureKey::from_key(key.require_parent(EntityType::Infrastructure)?)?;
        Ok(Self::new(producer, infrastructure))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumerBindingKey {
    pub consumer: ConsumerKey,
    pub infrastructure: InfrastructureKey,
}

impl ConsumerBindingKey {
    pub fn new(consumer: ConsumerKey, infrastructure: InfrastructureKey) -> Self {
        Self {
            consumer,
            infrastructure,
        }
    }

    /// The stream binding this consumer binding reads from.
    pub fn stream_binding(&self) -> StreamBindingKey {
        StreamBindingKey::new(self.consumer.stream.clone(), self.infrastructure.clone())
    }
}

impl ModelKey for ConsumerBindingKey {
    const ENTITY_TYPE: EntityType = EntityType::ConsumerBinding;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.infrastructure.name)
            .with_parent(self.consumer.to_key())
            .with_parent(self.infrastructure.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let consumer = ConsumerKey::from_key(key.require_parent(EntityType::Consumer)?)?;
        let infrastructure =
            InfrastructureKey::from_key(key.require_parent(EntityType::Infrastructure)?)?;
        Ok(Self::new(consumer, infrastructure))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessBindingKey {
    pub domain: DomainKey,
    pub name: String,
}

impl ProcessBindingKey {
    pub fn new(domain: DomainKey, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }
}

impl ModelKey for ProcessBindingKey {
    const ENTITY_TYPE: EntityType = EntityType::ProcessBinding;

    fn to_key(&self) -> Key {
        Key::new(Self::ENTITY_TYPE, &self.name).with_parent(self.domain.to_key())
    }

    fn from_key(key: &Key) -> Result<Self, TypeError> {
        key.expect_type(Self::ENTITY_TYPE)?;
        let domain = DomainKey::from_key(key.require_parent(EntityType::Domain)?)?;
        Ok(Self::new(domain, key.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> StreamKey {
        StreamKey::new(DomainKey::new("acme"), "orders", 3)
    }

    #[test]
    fn producer_binding_key_decodes_its_encoding() {
        let key = ProducerBindingKey::new(
            ProducerKey::new(stream(), ZoneKey::new("aws"), "checkout"),
            InfrastructureKey::new(ZoneKey::new("aws"), "kafka-1"),
        );
        let encoded = key.to_key();
        assert_eq!(encoded.parents().len(), 2);
        assert_eq!(ProducerBindingKey::from_key(&encoded).unwrap(), key);
    }

    #[test]
    fn stream_key_requires_a_version() {
        let unversioned =
            Key::new(EntityType::Stream, "orders").with_parent(DomainKey::new("acme").to_key());
        assert!(matches!(
            StreamKey::from_key(&unversioned),
            Err(TypeError::InvalidKey { .. })
        ));
    }

    #[test]
    fn decoding_checks_the_entity_type() {
        let zone = ZoneKey::new("aws").to_key();
        assert_eq!(
            DomainKey::from_key(&zone).unwrap_err(),
            TypeError::KeyTypeMismatch {
                expected: EntityType::Domain,
                actual: EntityType::Zone,
            }
        );
    }

    #[test]
    fn missing_parent_is_reported() {
        let orphan = Key::new(EntityType::Infrastructure, "kafka-1");
        let err = InfrastructureKey::from_key(&orphan).unwrap_err();
        assert!(err.to_string().contains("missing zone parent"));
    }

    #[test]
    fn derived_stream_binding_follows_the_producer_stream() {
        let infra = InfrastructureKey::new(ZoneKey::new("aws"), "kafka-1");
        let key = ProducerBindingKey::new(
            ProducerKey::new(stream(), ZoneKey::new("aws"), "checkout"),
            infra.clone(),
        );
        assert_eq!(key.stream_binding(), StreamBindingKey::new(stream(), infra));
    }
}
