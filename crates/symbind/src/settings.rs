//! Run settings.
//!
//! Starts from the ImGui preset. A `--config` JSON file may override any
//! top-level field of either section:
//!
//! ```json
//! {
//!   "types": { "wide_char_32": true, "strip_prefix": null },
//!   "resolver": { "ambiguity": "reject" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use symbind_signatures::{Metadata, ResolverConfig};
use symbind_types::TypeConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    types: Map<String, Value>,
    resolver: Map<String, Value>,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub types: TypeConfig,
    pub resolver: ResolverConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            types: TypeConfig::imgui(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings, applying the config file when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();
        let Some(path) = path else {
            return Ok(settings);
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let file: ConfigFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        settings.types = overlay(settings.types, file.types).context("Invalid 'types' section")?;
        settings.resolver =
            overlay(settings.resolver, file.resolver).context("Invalid 'resolver' section")?;
        Ok(settings)
    }

    /// Register the metadata's enum names with the type configuration.
    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        self.types = self.types.with_enums(metadata.enum_names());
        self
    }
}

/// Replace the top-level fields of `base` named in `overrides`.
fn overlay<T>(base: T, overrides: Map<String, Value>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    if overrides.is_empty() {
        return Ok(base);
    }
    let mut value = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut value {
        fields.extend(overrides);
    }
    Ok(serde_json::from_value(value)?)
}
