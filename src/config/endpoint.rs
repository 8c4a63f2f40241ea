//! Endpoint configuration

use crate::registry::ModelClass;
use serde::{Deserialize, Serialize};

/// One expert deployment, declared as an `[[endpoints]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Stable identifier; conventionally `<class>-<region>`
    pub id: String,
    #[serde(rename = "class")]
    pub model_class: ModelClass,
    pub region: String,
    pub url: String,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_max_concurrency() -> u32 {
    4
}
