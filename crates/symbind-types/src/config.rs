//! Type configuration.
//!
//! `TypeConfig` holds every lookup table the canonicalizer and the
//! equivalence relation consult. It is built once per run and passed by
//! reference, so canonicalization stays a pure function of
//! `(spelling, config)`.

use crate::types::Primitive;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A spelling-to-primitive substitution rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveRule {
    /// Whitespace-separated specifier words, e.g. `unsigned __int64`.
    pub spelling: String,
    pub primitive: Primitive,
}

impl PrimitiveRule {
    pub fn new(spelling: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            spelling: spelling.into(),
            primitive,
        }
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        self.spelling.split_whitespace()
    }

    fn word_count(&self) -> usize {
        self.words().count()
    }
}

/// Ordered primitive substitution table, longest spelling first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PrimitiveRule>", into = "Vec<PrimitiveRule>")]
pub struct PrimitiveTable {
    rules: Vec<PrimitiveRule>,
}

impl From<Vec<PrimitiveRule>> for PrimitiveTable {
    fn from(rules: Vec<PrimitiveRule>) -> Self {
        Self::new(rules)
    }
}

impl From<PrimitiveTable> for Vec<PrimitiveRule> {
    fn from(table: PrimitiveTable) -> Self {
        table.rules
    }
}

impl PrimitiveTable {
    /// Build a table. Rules are stably reordered so longer spellings are
    /// tried before their prefixes.
    pub fn new(mut rules: Vec<PrimitiveRule>) -> Self {
        rules.sort_by_key(|r| std::cmp::Reverse(r.word_count()));
        Self { rules }
    }

    pub fn rules(&self) -> &[PrimitiveRule] {
        &self.rules
    }

    /// Find the first rule whose words prefix `words`.
    ///
    /// Returns the primitive and how many words it consumed.
    pub fn lookup<S: AsRef<str>>(&self, words: &[S]) -> Option<(Primitive, usize)> {
        self.rules.iter().find_map(|rule| {
            let n = rule.word_count();
            if n > words.len() {
                return None;
            }
            let matched = rule
                .words()
                .zip(words.iter())
                .all(|(a, b)| a == b.as_ref());
            matched.then_some((rule.primitive, n))
        })
    }

    /// Whether `word` participates in any primitive spelling.
    pub fn is_type_word(&self, word: &str) -> bool {
        self.rules.iter().any(|r| r.words().any(|w| w == word))
    }
}

impl Default for PrimitiveTable {
    fn default() -> Self {
        use Primitive::*;
        let mut rules = vec![
            PrimitiveRule::new("unsigned long long", U64),
            PrimitiveRule::new("signed long long", S64),
            PrimitiveRule::new("unsigned short int", U16),
            PrimitiveRule::new("unsigned long int", U32),
            PrimitiveRule::new("unsigned __int64", U64),
            PrimitiveRule::new("signed __int64", S64),
            PrimitiveRule::new("unsigned short", U16),
            PrimitiveRule::new("unsigned int", U32),
            PrimitiveRule::new("unsigned char", U8),
            PrimitiveRule::new("unsigned long", U32),
            PrimitiveRule::new("signed char", S8),
            PrimitiveRule::new("signed short", S16),
            PrimitiveRule::new("signed int", S32),
            PrimitiveRule::new("long long", S64),
            PrimitiveRule::new("short int", S16),
            PrimitiveRule::new("long int", S32),
            PrimitiveRule::new("long double", Float64),
            PrimitiveRule::new("__int64", S64),
            PrimitiveRule::new("unsigned", U32),
            PrimitiveRule::new("signed", S32),
            PrimitiveRule::new("short", S16),
            PrimitiveRule::new("int", S32),
            PrimitiveRule::new("long", S32),
            PrimitiveRule::new("char", S8),
            PrimitiveRule::new("wchar_t", U16),
            PrimitiveRule::new("size_t", U64),
            PrimitiveRule::new("float", Float32),
            PrimitiveRule::new("double", Float64),
            PrimitiveRule::new("bool", Bool),
            PrimitiveRule::new("void", Void),
            PrimitiveRule::new("ImS8", S8),
            PrimitiveRule::new("ImU8", U8),
            PrimitiveRule::new("ImS16", S16),
            PrimitiveRule::new("ImU16", U16),
            PrimitiveRule::new("ImS32", S32),
            PrimitiveRule::new("ImU32", U32),
            PrimitiveRule::new("ImS64", S64),
            PrimitiveRule::new("ImU64", U64),
        ];
        // Canonical names map to themselves so canonical output re-parses.
        rules.extend(
            Primitive::ALL
                .iter()
                .map(|p| PrimitiveRule::new(p.name(), *p)),
        );
        Self::new(rules)
    }
}

/// A legacy one-off equivalence between an identifier and a type spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAlias {
    pub name: String,
    /// Target in canonical spelling.
    pub target: String,
}

impl LegacyAlias {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// Configuration for canonicalization and type equivalence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeConfig {
    /// Primitive substitution table.
    pub primitives: PrimitiveTable,

    /// Registered aliases: identifier to canonical spelling.
    pub aliases: BTreeMap<String, String>,

    /// Legacy special cases checked last.
    pub legacy_aliases: Vec<LegacyAlias>,

    /// Wide-character typedef whose width depends on `wide_char_32`.
    pub wide_char_name: Option<String>,

    /// Whether the wide-character typedef is 32 bits wide.
    pub wide_char_32: bool,

    /// Known enum names as they appear in the metadata.
    pub enum_names: BTreeSet<String>,

    /// Prefix stripped from named identifiers, e.g. `ImGui`.
    pub strip_prefix: Option<String>,

    /// Single-parameter templates kept as containers.
    pub containers: Vec<String>,
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            primitives: PrimitiveTable::default(),
            aliases: BTreeMap::new(),
            legacy_aliases: Vec::new(),
            wide_char_name: None,
            wide_char_32: false,
            enum_names: BTreeSet::new(),
            strip_prefix: None,
            containers: Vec::new(),
        }
    }
}

impl TypeConfig {
    /// Create an empty configuration with the default primitive table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for Dear ImGui style manifests.
    pub fn imgui() -> Self {
        let aliases = [
            ("ImPoolIdx", "s32"),
            ("ImTextureID", "*void"),
            ("ImDrawIdx", "u16"),
            ("ImFileHandle", "*void"),
            ("ID", "u32"),
            ("ImWchar16", "u16"),
            ("ImWchar32", "u32"),
            ("ImDrawCallback", "(parent_list: *ImDrawList, cmd: *ImDrawCmd)"),
            ("InputTextCallback", "(data: *InputTextCallbackData) -> s32"),
            ("SizeCallback", "(data: *SizeCallbackData)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            aliases,
            legacy_aliases: vec![
                LegacyAlias::new("ImWchar16", "u16"),
                LegacyAlias::new("ImWchar32", "u32"),
                LegacyAlias::new("ID", "u32"),
            ],
            wide_char_name: Some("ImWchar".to_string()),
            strip_prefix: Some("ImGui".to_string()),
            containers: vec![
                "ImVector".to_string(),
                "ImPool".to_string(),
                "ImChunkStream".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Register enum names.
    pub fn with_enums<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_wide_char_32(mut self, wide: bool) -> Self {
        self.wide_char_32 = wide;
        self
    }

    /// Strip the configured prefix from an identifier.
    ///
    /// An identifier equal to the prefix, one where the prefix is a
    /// namespace (`ImGui::Foo`), or one whose remainder starts with the
    /// prefix again (`ImGuiImGuiFoo`) is left alone, so stripping a
    /// stripped name is a no-op.
    pub fn strip_identifier<'a>(&self, name: &'a str) -> &'a str {
        match &self.strip_prefix {
            Some(prefix) => match name.strip_prefix(prefix.as_str()) {
                Some(rest)
                    if rest.starts_with(|c: char| c.is_ascii_alphanumeric())
                        && !rest.starts_with(prefix.as_str()) =>
                {
                    rest
                }
                _ => name,
            },
            None => name,
        }
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.containers.iter().any(|c| c == name)
    }

    /// Whether `name` denotes a known enum, trying the bare name and the
    /// common suffix variants the metadata uses.
    pub fn is_enum(&self, name: &str) -> bool {
        if self.enum_names.contains(name) || self.enum_names.contains(&format!("{}_", name)) {
            return true;
        }
        match &self.strip_prefix {
            Some(prefix) => {
                self.enum_names.contains(&format!("{}{}", prefix, name))
                    || self.enum_names.contains(&format!("{}{}_", prefix, name))
            }
            None => false,
        }
    }
}
