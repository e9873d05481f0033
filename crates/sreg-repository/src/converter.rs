use std::marker::PhantomData;

use sreg_types::{Entity, Model, TypeError};

/// Pure, bidirectional mapping between a model and its log-wire form.
///
/// `from_wire(to_wire(m)) == m` must hold for every model the converter
/// accepts.
pub trait Converter: Send + Sync {
    type Model;

    fn to_wire(&self, model: &Self::Model) -> Result<Entity, TypeError>;

    fn from_wire(&self, entity: &Entity) -> Result<Self::Model, TypeError>;
}

/// The converter every [`Model`] gets for free.
pub struct ModelConverter<M>(PhantomData<fn() -> M>);

impl<M> ModelConverter<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for ModelConverter<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ModelConverter<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M: Model> Converter for ModelConverter<M> {
    type Model = M;

    fn to_wire(&self, model: &M) -> Result<Entity, TypeError> {
        Ok(model.to_entity())
    }

    fn from_wire(&self, entity: &Entity) -> Result<M, TypeError> {
        entity.key.expect_type(M::ENTITY_TYPE)?;
        M::from_entity(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sreg_types::*;

    fn infra(name: &str) -> InfrastructureKey {
        InfrastructureKey::new(ZoneKey::new("aws"), name)
    }

    fn stream_key() -> StreamKey {
        StreamKey::new(DomainKey::new("acme"), "orders", 2)
    }

    fn check<M: Model>(model: M) {
        let converter = ModelConverter::<M>::new();
        let wire = converter.to_wire(&model).unwrap();
        assert_eq!(converter.from_wire(&wire).unwrap(), model);
    }

    #[test]
    fn round_trip_covers_optional_parts() {
        let bare = Specification::new("", "kafka");
        let full = Specification::new("orders topic", "kafka")
            .with_tag("team", "payments")
            .with_configuration(json!({"partitions": 12}))
            .with_security(Security::new("admin", ["alice"]))
            .with_function("compacted");

        for spec in [bare, full] {
            let mut sb = StreamBinding::new(
                StreamBindingKey::new(stream_key(), infra("kafka-1")),
                spec.clone(),
            );
            check(sb.clone());
            sb.set_status(Status::new(json!({"topicCreated": true})));
            check(sb);

            check(ProcessBinding::new(
                ProcessBindingKey::new(DomainKey::new("acme"), "enricher"),
                spec.clone(),
                ZoneKey::new("aws"),
                vec![StreamBindingKey::new(stream_key(), infra("kafka-1"))],
                vec![],
            ));
            check(Stream::new(
                stream_key(),
                spec,
                SchemaKey::new(DomainKey::new("acme"), "order"),
            ));
        }
    }

    #[test]
    fn wire_entity_of_another_type_is_rejected() {
        let zone = Zone::new(ZoneKey::new("aws"), Specification::new("", "cloud"));
        let wire = ModelConverter::<Zone>::new().to_wire(&zone).unwrap();
        assert!(matches!(
            ModelConverter::<Domain>::new().from_wire(&wire),
            Err(TypeError::KeyTypeMismatch { .. })
        ));
    }
}
