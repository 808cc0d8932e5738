//! Declaration manifest and enum/struct metadata.
//!
//! These mirror the `definitions.json` and `structs_and_enums.json` files
//! emitted by the cimgui generator. Map order is preserved so diagnostics
//! and reports follow the manifest.

use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use symbind_types::expr;
use tracing::debug;

/// One typed argument from `argsT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// One overload record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    /// Bare function name.
    pub funcname: String,

    /// Owning struct; empty for free functions.
    #[serde(default)]
    pub stname: String,

    #[serde(default)]
    pub namespace: Option<String>,

    /// Original C++ argument list, parenthesized, with defaults.
    #[serde(default)]
    pub argsoriginal: Option<String>,

    /// Typed argument list of the C wrapper, including `self`/`pOut`.
    #[serde(rename = "argsT", default)]
    pub args_t: Vec<TypedArg>,

    /// Default values keyed by argument name.
    #[serde(default, deserialize_with = "defaults_table")]
    pub defaults: IndexMap<String, String>,

    #[serde(default)]
    pub ret: Option<String>,

    /// Original return type when the wrapper returns through `pOut`.
    #[serde(default)]
    pub retorig: Option<String>,

    /// Definition location tag, e.g. `imgui:313` or `internal`.
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub constructor: bool,

    #[serde(default)]
    pub destructor: bool,

    /// Unique overload name.
    #[serde(default)]
    pub cimguiname: String,

    #[serde(rename = "nonUDT", default)]
    pub non_udt: Option<u8>,
}

impl DefinitionEntry {
    /// Owning struct, if any.
    pub fn struct_name(&self) -> Option<&str> {
        Some(self.stname.as_str()).filter(|s| !s.is_empty())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|s| !s.is_empty())
    }

    /// Declared in an internal header.
    pub fn is_internal(&self) -> bool {
        match &self.location {
            Some(location) => {
                let file = location.split(':').next().unwrap_or(location);
                file == "internal" || file.ends_with("_internal")
            }
            None => false,
        }
    }

    /// Name used in diagnostics: the overload name when present.
    pub fn display_name(&self) -> String {
        if !self.cimguiname.is_empty() {
            return self.cimguiname.clone();
        }
        match self.struct_name() {
            Some(st) => format!("{}::{}", st, self.funcname),
            None => self.funcname.clone(),
        }
    }
}

/// The generator writes `"defaults": []` when there are none.
fn defaults_table<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Table {
        Map(IndexMap<String, String>),
        List(Vec<serde_json::Value>),
        Null(()),
    }

    match Table::deserialize(deserializer)? {
        Table::Map(map) => Ok(map),
        Table::List(list) if list.is_empty() => Ok(IndexMap::new()),
        Table::List(_) => Err(serde::de::Error::custom("defaults list must be empty")),
        Table::Null(()) => Ok(IndexMap::new()),
    }
}

/// Overload-grouped function declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: IndexMap<String, Vec<DefinitionEntry>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        debug!(groups = manifest.entries.len(), "parsed manifest");
        Ok(manifest)
    }

    /// Load a manifest from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of overload records.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A JSON value that may be written either as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(t) => t.trim().parse().ok(),
        }
    }
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: NumberOrText,
    #[serde(default)]
    pub calc_value: Option<i64>,
}

/// One struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    /// Field name, possibly with array suffix (`TempBuffer[1024*3+1]`).
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Element count of an array field.
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub bitfield: Option<NumberOrText>,
    /// Element type of a flattened container field.
    #[serde(default)]
    pub template_type: Option<String>,
}

impl StructField {
    pub fn bitfield_width(&self) -> Option<u32> {
        self.bitfield
            .as_ref()
            .and_then(NumberOrText::as_number)
            .and_then(|n| u32::try_from(n).ok())
    }
}

/// Enum and struct metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub enums: IndexMap<String, Vec<EnumMember>>,
    #[serde(default)]
    pub structs: IndexMap<String, Vec<StructField>>,
    /// Type name to definition-location tag.
    #[serde(default)]
    pub locations: IndexMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let metadata: Self = serde_json::from_str(json)?;
        debug!(
            enums = metadata.enums.len(),
            structs = metadata.structs.len(),
            "parsed metadata"
        );
        Ok(metadata)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn enum_names(&self) -> impl Iterator<Item = &str> {
        self.enums.keys().map(String::as_str)
    }

    /// Resolve every enum member to its numeric value.
    ///
    /// Members given as expressions may refer to members defined earlier.
    /// Members that cannot be resolved are left out.
    pub fn enum_constants(&self) -> EnumConstants {
        let mut values = HashMap::new();
        for member in self.enums.values().flatten() {
            let value = match (member.calc_value, &member.value) {
                (Some(v), _) => Some(v),
                (None, NumberOrText::Number(n)) => Some(*n),
                (None, NumberOrText::Text(text)) => {
                    expr::evaluate(text, |name| values.get(name).copied()).ok()
                }
            };
            match value {
                Some(v) => {
                    values.insert(member.name.clone(), v);
                }
                None => debug!(member = %member.name, "unresolved enum value"),
            }
        }
        EnumConstants { values }
    }

    pub fn location(&self, type_name: &str) -> Option<&str> {
        self.locations.get(type_name).map(String::as_str)
    }
}

/// Enum member values, for array-size checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumConstants {
    values: HashMap<String, i64>,
}

impl EnumConstants {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
