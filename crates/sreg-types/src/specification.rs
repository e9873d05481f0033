use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `(name, value)` label attached to a specification.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named principal granted a security role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A role and the principals holding it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Security {
    pub role: String,
    pub principals: Vec<Principal>,
}

impl Security {
    pub fn new<I, S>(role: impl Into<String>, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            principals: principals.into_iter().map(Principal::new).collect(),
        }
    }
}

/// Declarative definition of an entity's intended configuration.
///
/// A specification is an immutable snapshot: updates replace it wholesale,
/// never field by field. Tags form a set, so their order never affects
/// equality. `spec_type` selects both the configuration schema and the
/// lifecycle handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<Tag>,
    #[serde(rename = "type")]
    pub spec_type: String,
    #[serde(default = "empty_object")]
    pub configuration: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Security>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl Specification {
    /// A specification with an empty configuration object.
    pub fn new(description: impl Into<String>, spec_type: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            tags: BTreeSet::new(),
            spec_type: spec_type.into(),
            configuration: empty_object(),
            security: Vec::new(),
            function: None,
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(Tag::new(name, value));
        self
    }

    pub fn with_configuration(mut self, configuration: Value) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_security(mut self, security: Security) -> Self {
        self.security.push(security);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// The configuration as a JSON object, if it is one.
    pub fn configuration_object(&self) -> Option<&Map<String, Value>> {
        self.configuration.as_object()
    }
}

/// Opaque operational state attached to an entity.
///
/// Status is written through its own path and never passes through
/// validation or lifecycle handlers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status {
    pub state: Value,
}

impl Status {
    pub fn new(state: Value) -> Self {
        Self { state }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new(empty_object())
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
