use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GateConfig;
use crate::error::SchemaError;

/// The JSON kind a configuration field must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    String,
    Number,
    Bool,
    Object,
    Array,
    Any,
}

impl JsonKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => !value.is_null(),
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Bool => "a boolean",
            Self::Object => "an object",
            Self::Array => "an array",
            Self::Any => "present",
        };
        f.write_str(s)
    }
}

/// Checks that a configuration blob is consistent with its specification
/// type.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, spec_type: &str, configuration: &Value) -> Result<(), SchemaError>;
}

/// Accepts any JSON object.
pub struct ObjectSchema;

impl SchemaValidator for ObjectSchema {
    fn validate(&self, spec_type: &str, configuration: &Value) -> Result<(), SchemaError> {
        if configuration.is_object() {
            Ok(())
        } else {
            Err(SchemaError::NotAnObject {
                spec_type: spec_type.to_string(),
            })
        }
    }
}

/// Requires named fields with given JSON kinds; other fields pass through.
#[derive(Clone, Debug, Default)]
pub struct RequiredFieldsSchema {
    fields: BTreeMap<String, JsonKind>,
}

impl RequiredFieldsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, kind: JsonKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }
}

impl From<BTreeMap<String, JsonKind>> for RequiredFieldsSchema {
    fn from(fields: BTreeMap<String, JsonKind>) -> Self {
        Self { fields }
    }
}

impl SchemaValidator for RequiredFieldsSchema {
    fn validate(&self, spec_type: &str, configuration: &Value) -> Result<(), SchemaError> {
        let object = configuration
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject {
                spec_type: spec_type.to_string(),
            })?;
        for (field, kind) in &self.fields {
            match object.get(field) {
                None | Some(Value::Null) => {
                    return Err(SchemaError::MissingField {
                        spec_type: spec_type.to_string(),
                        field: field.clone(),
                    })
                }
                Some(value) if !kind.matches(value) => {
                    return Err(SchemaError::WrongKind {
                        spec_type: spec_type.to_string(),
                        field: field.clone(),
                        expected: *kind,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Schema plugins keyed by specification `type`.
pub struct SchemaRegistry {
    validators: HashMap<String, Arc<dyn SchemaValidator>>,
    allow_unknown_types: bool,
}

impl SchemaRegistry {
    pub fn new(allow_unknown_types: bool) -> Self {
        Self {
            validators: HashMap::new(),
            allow_unknown_types,
        }
    }

    /// A registry holding a [`RequiredFieldsSchema`] for every configured
    /// type.
    pub fn from_config(config: &GateConfig) -> Self {
        let mut registry = Self::new(config.allow_unknown_types);
        for (spec_type, fields) in &config.schemas {
            registry.register(spec_type, RequiredFieldsSchema::from(fields.clone()));
        }
        registry
    }

    /// Register (or replace) the validator for `spec_type`.
    pub fn register(&mut self, spec_type: impl Into<String>, validator: impl SchemaValidator + 'static) {
        self.validators.insert(spec_type.into(), Arc::new(validator));
    }

    pub fn contains(&self, spec_type: &str) -> bool {
        self.validators.contains_key(spec_type)
    }

    pub fn validate(&self, spec_type: &str, configuration: &Value) -> Result<(), SchemaError> {
        match self.validators.get(spec_type) {
            Some(validator) => validator.validate(spec_type, configuration),
            None if self.allow_unknown_types => ObjectSchema.validate(spec_type, configuration),
            None => Err(SchemaError::UnknownType(spec_type.to_string())),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
