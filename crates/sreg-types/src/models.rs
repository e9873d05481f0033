//! The typed entity family of the stream registry.

use serde::{Deserialize, Serialize};

use crate::entity::{Links, Reference};
use crate::error::TypeError;
use crate::key::EntityType;
use crate::keys::{
    ConsumerBindingKey, ConsumerKey, DomainKey, InfrastructureKey, ProcessBindingKey,
    ProducerBindingKey, ProducerKey, SchemaKey, StreamBindingKey, StreamKey, ZoneKey,
};
use crate::model::{Model, ModelKey};
use crate::specification::{Specification, Status};

/// Implements the accessor half of [`Model`] for a struct with `key`,
/// `specification` and `status` fields.
macro_rules! model_accessors {
    ($key:ty) => {
        type Key = $key;

        fn key(&self) -> &$key {
            &self.key
        }

        fn specification(&self) -> &Specification {
            &self.specification
        }

        fn set_specification(&mut self, specification: Specification) {
            self.specification = specification;
        }

        fn status(&self) -> Option<&Status> {
            self.status.as_ref()
        }

        fn set_status(&mut self, status: Status) {
            self.status = Some(status);
        }
    };
}

/// Declares a model whose only references are its key parents, with its
/// [`Model`] impl. Extra trait items go in the trailing braces.
macro_rules! keyed_model {
    ($(#[$meta:meta])* $name:ident, $key:ty $(, { $($extra:tt)* })?) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub key: $key,
            pub specification: Specification,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub status: Option<Status>,
        }

        impl $name {
            pub fn new(key: $key, specification: Specification) -> Self {
                Self {
                    key,
                    specification,
                    status: None,
                }
            }
        }

        impl Model for $name {
            model_accessors!($key);

            fn from_parts(
                key: $key,
                specification: Specification,
                status: Option<Status>,
                _links: &Links,
            ) -> Result<Self, TypeError> {
                Ok(Self {
                    key,
                    specification,
                    status,
                })
            }

            $($($extra)*)?
        }
    };
}

keyed_model!(
    /// A business domain; the root of schemas, streams and process bindings.
    Domain,
    DomainKey
);

keyed_model!(Schema, SchemaKey);

/// A versioned stream within a domain, bound to one schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub key: StreamKey,
    pub specification: Specification,
    pub schema: SchemaKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl Stream {
    pub fn new(key: StreamKey, specification: Specification, schema: SchemaKey) -> Self {
        Self {
            key,
            specification,
            schema,
            status: None,
        }
    }
}

impl Model for Stream {
    model_accessors!(StreamKey);

    fn links(&self) -> Links {
        let mut links = Links::new();
        links.insert_one("schema", self.schema.to_key());
        links
    }

    fn from_parts(
        key: StreamKey,
        specification: Specification,
        status: Option<Status>,
        links: &Links,
    ) -> Result<Self, TypeError> {
        let schema = SchemaKey::from_key(links.one("schema", EntityType::Schema)?)?;
        Ok(Self {
            key,
            specification,
            schema,
            status,
        })
    }
}

keyed_model!(
    /// A deployment zone such as a region or data centre.
    Zone,
    ZoneKey
);

keyed_model!(Infrastructure, InfrastructureKey);

keyed_model!(Producer, ProducerKey);

keyed_model!(Consumer, ConsumerKey);

keyed_model!(
    /// A stream materialized on a piece of infrastructure.
    StreamBinding,
    StreamBindingKey
);

keyed_model!(
    /// A producer attached to infrastructure. Requires the matching stream
    /// binding to exist.
    ProducerBinding,
    ProducerBindingKey,
    {
        fn derived_references(&self) -> Vec<Reference> {
            vec![Reference::new("streamBinding", self.key.stream_binding().to_key())]
        }
    }
);

keyed_model!(
    /// A consumer attached to infrastructure. Requires the matching stream
    /// binding to exist.
    ConsumerBinding,
    ConsumerBindingKey,
    {
        fn derived_references(&self) -> Vec<Reference> {
            vec![Reference::new("streamBinding", self.key.stream_binding().to_key())]
        }
    }
);

/// A process running in a zone that reads from and writes to stream
/// bindings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessBinding {
    pub key: ProcessBindingKey,
    pub specification: Specification,
    pub zone: ZoneKey,
    #[serde(default)]
    pub inputs: Vec<StreamBindingKey>,
    #[serde(default)]
    pub outputs: Vec<StreamBindingKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ProcessBinding {
    pub fn new(
        key: ProcessBindingKey,
        specification: Specification,
        zone: ZoneKey,
        inputs: Vec<StreamBindingKey>,
        outputs: Vec<StreamBindingKey>,
    ) -> Self {
        Self {
            key,
            specification,
            zone,
            inputs,
            outputs,
            status: None,
        }
    }
}

impl Model for ProcessBinding {
    model_accessors!(ProcessBindingKey);

    fn links(&self) -> Links {
        let mut links = Links::new();
        links.insert_one("zone", self.zone.to_key());
        links.insert_many("inputs", self.inputs.iter().map(ModelKey::to_key).collect());
        links.insert_many("outputs", self.outputs.iter().map(ModelKey::to_key).collect());
        links
    }

    fn check_structure(&self) -> Result<(), (String, String)> {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return Err((
                "inputs".into(),
                "a process binding needs at least one input or output".into(),
            ));
        }
        Ok(())
    }

    fn from_parts(
        key: ProcessBindingKey,
        specification: Specification,
        status: Option<Status>,
        links: &Links,
    ) -> Result<Self, TypeError> {
        let zone = ZoneKey::from_key(links.one("zone", EntityType::Zone)?)?;
        let bindings = |field: &str| -> Result<Vec<StreamBindingKey>, TypeError> {
            links
                .many(field, EntityType::StreamBinding)?
                .iter()
                .map(StreamBindingKey::from_key)
                .collect()
        };
        Ok(Self {
            key,
            specification,
            zone,
            inputs: bindings("inputs")?,
            outputs: bindings("outputs")?,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream_key() -> StreamKey {
        StreamKey::new(DomainKey::new("acme"), "orders", 1)
    }

    fn binding(infra: &str) -> StreamBindingKey {
        StreamBindingKey::new(
            stream_key(),
            InfrastructureKey::new(ZoneKey::new("aws"), infra),
        )
    }

    #[test]
    fn stream_round_trips_through_the_wire_entity() {
        let mut stream = Stream::new(
            stream_key(),
            Specification::new("orders", "avro"),
            SchemaKey::new(DomainKey::new("acme"), "order"),
        );
        stream.set_status(Status::new(json!({"healthy": true})));

        let entity = stream.to_entity();
        assert_eq!(entity.entity_type(), EntityType::Stream);
        assert_eq!(Stream::from_entity(&entity).unwrap(), stream);
    }

    #[test]
    fn stream_without_schema_link_fails_to_decode() {
        let stream = Stream::new(
            stream_key(),
            Specification::new("", "avro"),
            SchemaKey::new(DomainKey::new("acme"), "order"),
        );
        let mut entity = stream.to_entity();
        entity.links = Links::new();
        assert!(matches!(
            Stream::from_entity(&entity),
            Err(TypeError::InvalidLink { .. })
        ));
    }

    #[test]
    fn process_binding_references_key_zone_and_bindings() {
        let pb = ProcessBinding::new(
            ProcessBindingKey::new(DomainKey::new("acme"), "enricher"),
            Specification::new("", "flink"),
            ZoneKey::new("aws"),
            vec![binding("kafka-1")],
            vec![binding("kafka-2")],
        );
        let fields: Vec<_> = pb.references().into_iter().map(|r| r.field).collect();
        assert_eq!(fields, ["key.domain", "inputs", "outputs", "zone"]);
        assert!(pb.depends_on(&binding("kafka-2").to_key()));
        assert!(!pb.depends_on(&stream_key().to_key()));
    }

    #[test]
    fn process_binding_needs_inputs_or_outputs() {
        let pb = ProcessBinding::new(
            ProcessBindingKey::new(DomainKey::new("acme"), "idle"),
            Specification::new("", "flink"),
            ZoneKey::new("aws"),
            vec![],
            vec![],
        );
        let (field, _) = pb.check_structure().unwrap_err();
        assert_eq!(field, "inputs");
    }

    #[test]
    fn producer_binding_depends_on_its_stream_binding() {
        let infra = InfrastructureKey::new(ZoneKey::new("aws"), "kafka-1");
        let pb = ProducerBinding::new(
            ProducerBindingKey::new(
                ProducerKey::new(stream_key(), ZoneKey::new("aws"), "checkout"),
                infra.clone(),
            ),
            Specification::new("", "kafka"),
        );
        assert!(pb.depends_on(&binding("kafka-1").to_key()));
        assert!(pb.depends_on(&infra.to_key()));
        assert!(!pb.depends_on(&ZoneKey::new("aws").to_key()));
    }

    #[test]
    fn keyed_models_round_trip_with_status() {
        let mut zone = Zone::new(ZoneKey::new("aws"), Specification::new("", "cloud"));
        zone.set_status(Status::new(json!({"phase": "ready"})));
        let entity = zone.to_entity();
        assert!(entity.links.is_empty());
        assert_eq!(Zone::from_entity(&entity).unwrap(), zone);
        assert!(zone.derived_references().is_empty());
    }

    #[test]
    fn consumer_binding_derives_its_stream_binding() {
        let cb = ConsumerBinding::new(
            ConsumerBindingKey::new(
                ConsumerKey::new(stream_key(), ZoneKey::new("aws"), "billing"),
                InfrastructureKey::new(ZoneKey::new("aws"), "kafka-1"),
            ),
            Specification::new("", "kafka"),
        );
        let derived = cb.derived_references();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].field, "streamBinding");
        assert_eq!(derived[0].key, binding("kafka-1").to_key());
        assert_eq!(ConsumerBinding::from_entity(&cb.to_entity()).unwrap(), cb);
    }

    #[test]
    fn documents_deserialize_with_defaults() {
        let consumer: Consumer = serde_json::from_value(json!({
            "key": {
                "stream": {"domain": {"name": "acme"}, "name": "orders", "version": 1},
                "zone": {"name": "aws"},
                "name": "billing"
            },
            "specification": {"type": "kafka"}
        }))
        .unwrap();
        assert!(consumer.status.is_none());
        assert_eq!(consumer.specification.description, "");
    }
}
