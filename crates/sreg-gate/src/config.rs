use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::JsonKind;

/// Configuration for the validator chain and the schema registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Longest description accepted, in characters.
    pub max_description_len: usize,
    /// Reject updates that change the specification `type`.
    pub immutable_type: bool,
    /// Accept any object configuration for types without a registered
    /// schema. When `false`, such types are rejected.
    pub allow_unknown_types: bool,
    /// Per-type required configuration fields and their JSON kinds.
    pub schemas: BTreeMap<String, BTreeMap<String, JsonKind>>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_description_len: 1024,
            immutable_type: true,
            allow_unknown_types: true,
            schemas: BTreeMap::new(),
        }
    }
}

impl GateConfig {
    /// A configuration that only accepts registered types.
    pub fn strict() -> Self {
        Self {
            allow_unknown_types: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_load_from_toml() {
        let config: GateConfig = toml::from_str(
            r#"
            immutable_type = false

            [schemas.kafka]
            partitions = "number"
            topic = "string"
            "#,
        )
        .unwrap();
        assert!(!config.immutable_type);
        assert!(config.allow_unknown_types);
        assert_eq!(config.schemas["kafka"]["partitions"], JsonKind::Number);
    }
}
