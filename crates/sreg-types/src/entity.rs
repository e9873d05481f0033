use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::key::{EntityType, Key};
use crate::specification::{Specification, Status};

/// Named, non-key references from one entity to others.
///
/// A stream's schema, a process binding's zone and its input/output stream
/// bindings all travel as links. Links are part of the wire entity so typed
/// models round-trip without loss.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Vec<Key>>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert_one(&mut self, field: impl Into<String>, key: Key) {
        self.0.insert(field.into(), vec![key]);
    }

    pub fn insert_many(&mut self, field: impl Into<String>, keys: Vec<Key>) {
        self.0.insert(field.into(), keys);
    }

    /// The single key stored under `field`, checked against `expected`.
    pub fn one(&self, field: &str, expected: EntityType) -> Result<&Key, TypeError> {
        match self.0.get(field).map(Vec::as_slice) {
            Some([key]) => {
                key.expect_type(expected)?;
                Ok(key)
            }
            Some(keys) => Err(TypeError::InvalidLink {
                field: field.to_string(),
                reason: format!("expected exactly one key, found {}", keys.len()),
            }),
            None => Err(TypeError::InvalidLink {
                field: field.to_string(),
                reason: "missing".into(),
            }),
        }
    }

    /// All keys stored under `field`; an absent field is an empty list.
    pub fn many(&self, field: &str, expected: EntityType) -> Result<&[Key], TypeError> {
        let keys = self.0.get(field).map(Vec::as_slice).unwrap_or_default();
        for key in keys {
            key.expect_type(expected)?;
        }
        Ok(keys)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Key])> {
        self.0.iter().map(|(f, keys)| (f.as_str(), keys.as_slice()))
    }
}

/// The log-wire representation of any entity.
///
/// This is what the event log carries and what materialized views store;
/// typed models convert to and from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: Key,
    pub specification: Specification,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        self.key.entity_type()
    }
}

/// A key some entity depends on, and the field that names it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub field: String,
    pub key: Key,
}

impl Reference {
    pub fn new(field: impl Into<String>, key: Key) -> Self {
        Self {
            field: field.into(),
            key,
        }
    }
}
