use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use sreg_types::{
    Consumer, ConsumerBinding, Domain, Infrastructure, Key, Model, ModelKey, ProcessBinding,
    Producer, ProducerBinding, Schema, Stream, StreamBinding, Zone,
};

/// A typed entity as the CLI reads and prints it: the model's own JSON
/// plus a `kind` tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Domain(Domain),
    Schema(Schema),
    Stream(Stream),
    Zone(Zone),
    Infrastructure(Infrastructure),
    Producer(Producer),
    Consumer(Consumer),
    StreamBinding(StreamBinding),
    ProducerBinding(ProducerBinding),
    ConsumerBinding(ConsumerBinding),
    ProcessBinding(ProcessBinding),
}

macro_rules! document_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Document {
                fn from(model: $variant) -> Self {
                    Document::$variant(model)
                }
            }
        )*

        impl Document {
            pub fn key(&self) -> Key {
                match self {
                    $(Document::$variant(model) => model.key().to_key(),)*
                }
            }
        }
    };
}

document_from!(
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
);

/// Run `$body` with `$service` bound to the registry service for the
/// document's type and `$model` to the typed model.
macro_rules! with_service {
    ($registry:expr, $document:expr, |$service:ident, $model:ident| $body:expr) => {
        match $document {
            Document::Domain($model) => { let $service = $registry.domains(); $body }
            Document::Schema($model) => { let $service = $registry.schemas(); $body }
            Document::Stream($model) => { let $service = $registry.streams(); $body }
            Document::Zone($model) => { let $service = $registry.zones(); $body }
            Document::Infrastructure($model) => { let $service = $registry.infrastructures(); $body }
            Document::Producer($model) => { let $service = $registry.producers(); $body }
            Document::Consumer($model) => { let $service = $registry.consumers(); $body }
            Document::StreamBinding($model) => { let $service = $registry.stream_bindings(); $body }
            Document::ProducerBinding($model) => { let $service = $registry.producer_bindings(); $body }
            Document::ConsumerBinding($model) => { let $service = $registry.consumer_bindings(); $body }
            Document::ProcessBinding($model) => { let $service = $registry.process_bindings(); $body }
        }
    };
}

pub(crate) use with_service;

impl Document {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid entity document")
    }

    /// Read a document from `path`, or from stdin when `path` is `-`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = if path == Path::new("-") {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("cannot read document from stdin")?;
            text
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?
        };
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sreg_types::{DomainKey, SchemaKey, Specification, StreamKey, ZoneKey};

    #[test]
    fn kind_tag_selects_the_model() {
        let document = Document::parse(
            r#"{
                "kind": "zone",
                "key": {"name": "aws"},
                "specification": {"type": "cloud"}
            }"#,
        )
        .unwrap();
        assert_eq!(
            document,
            Document::Zone(Zone::new(ZoneKey::new("aws"), Specification::new("", "cloud")))
        );
        assert_eq!(document.key(), ZoneKey::new("aws").to_key());
    }

    #[test]
    fn printed_document_carries_the_kind() {
        let stream = Stream::new(
            StreamKey::new(DomainKey::new("acme"), "orders", 2),
            Specification::new("", "avro"),
            SchemaKey::new(DomainKey::new("acme"), "order"),
        );
        let value = serde_json::to_value(Document::from(stream.clone())).unwrap();
        assert_eq!(value["kind"], json!("stream"));
        assert_eq!(value["key"]["version"], json!(2));
        assert_eq!(
            serde_json::from_value::<Document>(value).unwrap(),
            Document::Stream(stream)
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Document::parse(r#"{"kind": "topic", "key": {"name": "x"}}"#).unwrap_err();
        assert!(err.to_string().contains("invalid entity document"));
    }
}
