use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handler registry configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Fail with `NoHandler` instead of falling back to the pass-through
    /// default when nothing matches.
    pub require_handler: bool,
    /// Configuration defaults per specification `type`. Each entry registers
    /// a `ConfigurationDefaultsHandler` for that type.
    pub defaults: BTreeMap<String, Map<String, Value>>,
}
