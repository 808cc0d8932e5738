//! Manifest-side function descriptors.

use crate::defaults::DefaultValue;
use crate::manifest::{DefinitionEntry, Manifest, TypedArg};
use crate::diagnostics::{Diagnostics, MalformedEntry};
use crate::resolver::ResolverConfig;
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use symbind_types::{
    parse_argument, split_args, ArgumentRecord, CanonicalType, Canonicalizer, ParseError,
    ParseResult,
};
use tracing::{debug, info};

/// Name of the hidden output argument of the C wrapper.
const HIDDEN_OUTPUT: &str = "pOut";

/// Name of the explicit receiver argument of the C wrapper.
const RECEIVER: &str = "self";

/// One manifest overload, ready for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Bare function name.
    pub name: String,
    /// Unique overload name, for diagnostics.
    pub overload_name: String,
    pub struct_name: Option<String>,
    pub namespace: Option<String>,
    /// Arguments in declaration order, `self` first when present.
    pub args: Vec<ArgumentRecord>,
    pub return_type: CanonicalType,
    pub location: Option<String>,
    pub is_constructor: bool,
    pub is_destructor: bool,
    pub has_implicit_self: bool,
    pub has_hidden_output: bool,
    /// Default values keyed by argument name.
    pub defaults: IndexMap<String, DefaultValue>,
}

impl FunctionDescriptor {
    /// Build a descriptor from one overload record.
    pub fn from_entry(entry: &DefinitionEntry, canon: &Canonicalizer<'_>) -> ParseResult<Self> {
        let malformed = |reason: String| ParseError::MalformedDeclaration {
            text: entry.display_name(),
            reason,
        };

        let mut typed: &[TypedArg] = &entry.args_t;
        let mut has_hidden_output = false;
        let mut hidden_return = None;
        if let Some((first, rest)) = typed.split_first() {
            if first.name == HIDDEN_OUTPUT {
                has_hidden_output = true;
                let out = canon.canonicalize(&first.ty)?;
                hidden_return = out.strip_indirection().cloned();
                typed = rest;
            }
        }

        let mut self_arg = None;
        if let Some((first, rest)) = typed.split_first() {
            if first.name == RECEIVER {
                let ty = canon.canonicalize(&first.ty)?;
                self_arg = Some(ArgumentRecord::new(RECEIVER, first.ty.clone(), ty));
                typed = rest;
            }
        }

        let mut args = match &entry.argsoriginal {
            Some(original) => parse_argument_list(original, canon)?,
            None => typed
                .iter()
                .enumerate()
                .map(|(i, arg)| typed_argument(arg, i, canon))
                .collect::<ParseResult<Vec<_>>>()?,
        };

        if !entry.args_t.is_empty() && args.len() != typed.len() {
            return Err(malformed(format!(
                "argsoriginal has {} arguments, argsT has {}",
                args.len(),
                typed.len()
            )));
        }

        let has_implicit_self = self_arg.is_some();
        if let Some(receiver) = self_arg {
            args.insert(0, receiver);
        }

        let return_type = if has_hidden_output {
            match &entry.retorig {
                Some(ret) => canon.canonicalize(ret)?,
                None => hidden_return
                    .ok_or_else(|| malformed("pOut is not a pointer".to_string()))?,
            }
        } else {
            match entry.ret.as_deref().map(str::trim) {
                Some(ret) if !ret.is_empty() => canon.canonicalize(ret)?,
                _ => CanonicalType::void(),
            }
        };

        let defaults = entry
            .defaults
            .iter()
            .map(|(name, text)| (name.clone(), DefaultValue::parse(text)))
            .collect();

        Ok(Self {
            name: entry.funcname.clone(),
            overload_name: entry.display_name(),
            struct_name: entry.struct_name().map(str::to_string),
            namespace: entry.namespace().map(str::to_string),
            args,
            return_type,
            location: entry.location.clone(),
            is_constructor: entry.constructor,
            is_destructor: entry.destructor,
            has_implicit_self,
            has_hidden_output,
            defaults,
        })
    }

    /// The default for `name`: the manifest table first, then the
    /// declaration's own `=value` suffix.
    pub fn default_for(&self, name: &str) -> Option<DefaultValue> {
        if let Some(value) = self.defaults.get(name) {
            return Some(value.clone());
        }
        self.args
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.default.as_deref())
            .map(DefaultValue::parse)
    }

    /// Arguments compared against a binary symbol with an implicit receiver.
    pub fn explicit_args(&self) -> &[ArgumentRecord] {
        if self.has_implicit_self {
            &self.args[1..]
        } else {
            &self.args
        }
    }

    /// `Owner::name` for messages.
    pub fn qualified_name(&self) -> String {
        match self.struct_name.as_deref().or(self.namespace.as_deref()) {
            Some(owner) => format!("{}::{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// Parse a parenthesized `argsoriginal` list.
pub fn parse_argument_list(original: &str, canon: &Canonicalizer<'_>) -> ParseResult<Vec<ArgumentRecord>> {
    let trimmed = original.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);

    let pieces = split_args(inner);
    if pieces.len() == 1 && matches!(pieces[0].trim(), "" | "void") {
        return Ok(Vec::new());
    }
    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| parse_argument(piece, i, canon))
        .collect()
}

fn typed_argument(arg: &TypedArg, index: usize, canon: &Canonicalizer<'_>) -> ParseResult<ArgumentRecord> {
    if arg.ty == "..." || arg.name == "..." {
        return parse_argument("...", index, canon);
    }
    let ty = canon.canonicalize(&arg.ty)?;
    Ok(ArgumentRecord::new(arg.name.clone(), arg.ty.clone(), ty))
}

/// Build descriptors for every manifest entry that takes part in resolution.
///
/// Constructors, destructors and (when `skip_internal` is set) internal
/// entries are counted and left out. Malformed entries are counted and
/// skipped; fatal canonicalization errors abort. Entries named in
/// `config.diagnose` log their parsed arguments at `info`.
pub fn collect_descriptors(
    manifest: &Manifest,
    canon: &Canonicalizer<'_>,
    config: &ResolverConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<FunctionDescriptor>> {
    let skip_internal = config.skip_internal;
    let mut descriptors = Vec::with_capacity(manifest.len());

    for (group, overloads) in &manifest.entries {
        if skip_internal && !overloads.is_empty() && overloads.iter().all(DefinitionEntry::is_internal) {
            debug!(%group, "skipping internal group");
            diagnostics.skipped_internal_groups += 1;
            continue;
        }

        for entry in overloads {
            diagnostics.entries += 1;
            if entry.destructor {
                diagnostics.skipped_destructors += 1;
                continue;
            }
            if entry.constructor {
                diagnostics.skipped_constructors += 1;
                continue;
            }
            if skip_internal && entry.is_internal() {
                diagnostics.skipped_internal += 1;
                continue;
            }

            match FunctionDescriptor::from_entry(entry, canon) {
                Ok(descriptor) => {
                    let diagnose = config.diagnoses(&descriptor);
                    for arg in &descriptor.args {
                        escalate!(
                            diagnose,
                            name = %descriptor.overload_name,
                            arg = %arg.name,
                            raw = %arg.raw_type,
                            ty = %arg.ty,
                            "parsed argument"
                        );
                    }
                    escalate!(
                        diagnose,
                        name = %descriptor.overload_name,
                        ret = %descriptor.return_type,
                        "built descriptor"
                    );
                    descriptors.push(descriptor);
                }
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    if config.diagnoses_entry(entry) {
                        info!(name = %entry.display_name(), error = %err, "malformed entry");
                    }
                    debug!(name = %entry.display_name(), error = %err, "skipping malformed entry");
                    diagnostics.malformed.push(MalformedEntry {
                        name: entry.display_name(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbind_types::{Primitive, TypeConfig};

    fn entry(json: &str) -> DefinitionEntry {
        serde_json::from_str(json).unwrap()
    }

    fn build(json: &str) -> ParseResult<FunctionDescriptor> {
        let config = TypeConfig::imgui();
        FunctionDescriptor::from_entry(&entry(json), &Canonicalizer::new(&config))
    }

    #[test]
    fn test_free_function() {
        let desc = build(
            r#"{
                "funcname": "Begin", "namespace": "ImGui", "stname": "", "cimguiname": "igBegin",
                "argsT": [{"name": "name", "type": "const char*"}, {"name": "p_open", "type": "bool*"}, {"name": "flags", "type": "ImGuiWindowFlags"}],
                "argsoriginal": "(const char* name,bool* p_open=((void*)0),ImGuiWindowFlags flags=0)",
                "defaults": {"flags": "0", "p_open": "NULL"},
                "ret": "bool"
            }"#,
        )
        .unwrap();
        assert_eq!(desc.name, "Begin");
        assert_eq!(desc.overload_name, "igBegin");
        assert_eq!(desc.namespace.as_deref(), Some("ImGui"));
        assert_eq!(desc.struct_name, None);
        assert_eq!(desc.args.len(), 3);
        assert_eq!(desc.args[1].default.as_deref(), Some("((void*)0)"));
        assert_eq!(desc.return_type, CanonicalType::primitive(Primitive::Bool));
        assert!(desc.default_for("p_open").unwrap().is_null());
        assert!(!desc.has_implicit_self);
    }

    #[test]
    fn test_self_is_prepended() {
        let desc = build(
            r#"{
                "funcname": "GetWindowSize", "stname": "ImGuiWindow",
                "argsT": [{"name": "self", "type": "ImGuiWindow*"}],
                "argsoriginal": "()",
                "ret": "ImVec2"
            }"#,
        )
        .unwrap();
        assert!(desc.has_implicit_self);
        assert_eq!(desc.args.len(), 1);
        assert_eq!(desc.args[0].name, "self");
        assert_eq!(desc.args[0].ty.to_string(), "*Window");
        assert!(desc.explicit_args().is_empty());
        assert_eq!(desc.qualified_name(), "ImGuiWindow::GetWindowSize");
    }

    #[test]
    fn test_hidden_output_becomes_return() {
        let desc = build(
            r#"{
                "funcname": "GetWindowPos", "namespace": "ImGui",
                "argsT": [{"name": "pOut", "type": "ImVec2*"}],
                "argsoriginal": "()",
                "nonUDT": 1,
                "ret": "void"
            }"#,
        )
        .unwrap();
        assert!(desc.has_hidden_output);
        assert!(desc.args.is_empty());
        assert_eq!(desc.return_type, CanonicalType::named("ImVec2"));

        let desc = build(
            r#"{
                "funcname": "GetColor", "namespace": "ImGui",
                "argsT": [{"name": "pOut", "type": "ImVec4*"}, {"name": "idx", "type": "int"}],
                "argsoriginal": "(int idx)",
                "ret": "void",
                "retorig": "const ImVec4&"
            }"#,
        )
        .unwrap();
        assert_eq!(desc.args.len(), 1);
        assert_eq!(desc.return_type.to_string(), "*ImVec4");
    }

    #[test]
    fn test_without_argsoriginal() {
        let desc = build(
            r#"{
                "funcname": "Text", "namespace": "ImGui",
                "argsT": [{"name": "fmt", "type": "const char*"}, {"name": "...", "type": "..."}],
                "ret": "void"
            }"#,
        )
        .unwrap();
        assert_eq!(desc.args.len(), 2);
        assert_eq!(desc.args[1].name, "args");
        assert!(desc.args[1].is_variadic());
    }

    #[test]
    fn test_argument_count_mismatch() {
        let err = build(
            r#"{
                "funcname": "Broken", "cimguiname": "igBroken",
                "argsT": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
                "argsoriginal": "(int a)"
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MalformedDeclaration { .. }));
        assert!(err.to_string().contains("igBroken"));
    }

    #[test]
    fn test_default_from_declaration() {
        let desc = build(
            r#"{
                "funcname": "Dummy", "namespace": "ImGui",
                "argsT": [{"name": "size", "type": "const ImVec2"}],
                "argsoriginal": "(const ImVec2& size=ImVec2(0,0))"
            }"#,
        )
        .unwrap();
        assert!(desc.default_for("size").unwrap().is_constructor());
        assert!(desc.default_for("missing").is_none());
        assert!(desc.return_type.is_void());
    }

    #[test]
    fn test_collect_skips() {
        let manifest = Manifest::from_json(
            r#"{
                "ImVec2_ImVec2": [
                    {"funcname": "ImVec2", "stname": "ImVec2", "constructor": true, "argsoriginal": "()"}
                ],
                "ImVec2_destroy": [
                    {"funcname": "destroy", "stname": "ImVec2", "destructor": true}
                ],
                "igInternalOnly": [
                    {"funcname": "InternalOnly", "location": "imgui_internal:10", "argsoriginal": "()"}
                ],
                "igMixed": [
                    {"funcname": "Mixed", "location": "imgui:1", "argsoriginal": "()"},
                    {"funcname": "Mixed", "location": "imgui_internal:2", "argsoriginal": "(int x)"}
                ],
                "igBad": [
                    {"funcname": "Bad", "argsoriginal": "(int @x)"}
                ]
            }"#,
        )
        .unwrap();
        let config = TypeConfig::imgui();
        let mut diagnostics = Diagnostics::default();
        let descriptors =
            collect_descriptors(&manifest, &Canonicalizer::new(&config), &ResolverConfig::default(), &mut diagnostics)
                .unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "Mixed");
        assert_eq!(diagnostics.skipped_constructors, 1);
        assert_eq!(diagnostics.skipped_destructors, 1);
        assert_eq!(diagnostics.skipped_internal_groups, 1);
        assert_eq!(diagnostics.skipped_internal, 1);
        assert_eq!(diagnostics.malformed.len(), 1);
        assert_eq!(diagnostics.malformed[0].name, "Bad");
    }
}
