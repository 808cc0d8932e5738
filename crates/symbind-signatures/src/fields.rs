//! Struct field canonicalization.
//!
//! Field records carry their own quirks: array dimensions written on the
//! name (`TempBuffer[1024*3+1]`), container fields flattened into a
//! mangled identifier (`ImVector_ImGuiWindowPtr`) plus a separate
//! `template_type`, and an element count that must agree with the
//! dimensions.

use crate::manifest::{EnumConstants, StructField};
use crate::Result;
use serde::{Deserialize, Serialize};
use symbind_types::{CanonicalType, Canonicalizer, ParseError, ParseResult};
use tracing::trace;

/// A canonicalized struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub ty: CanonicalType,
    /// Bit width of a bitfield member.
    pub bitfield: Option<u32>,
}

/// Canonicalize one field.
pub fn canonicalize_field(
    field: &StructField,
    canon: &Canonicalizer<'_>,
    constants: &EnumConstants,
) -> ParseResult<FieldRecord> {
    let (name, dims) = split_name_dims(&field.name).ok_or_else(|| ParseError::MalformedDeclaration {
        text: field.name.clone(),
        reason: "unbalanced array suffix on field name".to_string(),
    })?;

    let base = match &field.template_type {
        Some(template) => expand_template(&field.ty, template, canon.config().containers.as_slice()),
        None => field.ty.clone(),
    };
    let spelling = format!("{}{}", base, dims);

    let ty = match field.size {
        Some(size) => canon.canonicalize_with_size_hint(&spelling, size, |id| constants.get(id))?,
        None => canon.canonicalize(&spelling)?,
    };
    trace!(field = name, ty = %ty, "canonicalized field");

    Ok(FieldRecord {
        name: name.to_string(),
        ty,
        bitfield: field.bitfield_width(),
    })
}

/// Canonicalize every field of one struct, in declaration order.
pub fn canonicalize_struct(
    fields: &[StructField],
    canon: &Canonicalizer<'_>,
    constants: &EnumConstants,
) -> Result<Vec<FieldRecord>> {
    fields
        .iter()
        .map(|field| canonicalize_field(field, canon, constants).map_err(Into::into))
        .collect()
}

/// `Name[a][b]` to (`Name`, `[a][b]`).
fn split_name_dims(name: &str) -> Option<(&str, &str)> {
    let name = name.trim();
    match name.find('[') {
        Some(open) if name.ends_with(']') => Some((name[..open].trim_end(), &name[open..])),
        Some(_) => None,
        None if name.contains(']') => None,
        None => Some((name, "")),
    }
}

/// Rebuild `Container<T>` from a flattened `Container_TPtr` identifier.
///
/// The flattened suffix is `_` followed by `template` with spaces turned
/// into underscores and a trailing `*` spelled `Ptr`. Identifiers that do
/// not carry that suffix for a known container are returned unchanged.
fn expand_template(ty: &str, template: &str, containers: &[String]) -> String {
    let template = template.trim();
    let (element, ptr) = match template.strip_suffix('*') {
        Some(inner) => (inner.trim_end(), "Ptr"),
        None => (template, ""),
    };
    let suffix = format!("_{}{}", element.replace(' ', "_"), ptr);

    let ty = ty.trim();
    match ty.strip_suffix(suffix.as_str()) {
        Some(container) if containers.iter().any(|c| c == container) => {
            format!("{}<{}>", container, template)
        }
        _ => ty.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Metadata, NumberOrText};
    use symbind_types::{Primitive, TypeConfig};

    fn field(name: &str, ty: &str) -> StructField {
        StructField {
            name: name.to_string(),
            ty: ty.to_string(),
            size: None,
            bitfield: None,
            template_type: None,
        }
    }

    fn constants() -> EnumConstants {
        Metadata::from_json(
            r#"{
                "enums": {
                    "ImGuiCol_": [
                        {"name": "ImGuiCol_Text", "value": 0},
                        {"name": "ImGuiCol_COUNT", "value": 53}
                    ]
                }
            }"#,
        )
        .unwrap()
        .enum_constants()
    }

    #[test]
    fn test_plain_field() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let rec = canonicalize_field(&field("Alpha", "float"), &canon, &constants()).unwrap();
        assert_eq!(rec.name, "Alpha");
        assert_eq!(rec.ty, CanonicalType::primitive(Primitive::Float32));
        assert_eq!(rec.bitfield, None);
    }

    #[test]
    fn test_template_field() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);

        let mut f = field("Windows", "ImVector_ImGuiWindowPtr");
        f.template_type = Some("ImGuiWindow*".to_string());
        let rec = canonicalize_field(&f, &canon, &constants()).unwrap();
        assert_eq!(rec.ty.to_string(), "ImVector(*Window)");

        let mut f = field("Chars", "ImVector_unsigned_short");
        f.template_type = Some("unsigned short".to_string());
        let rec = canonicalize_field(&f, &canon, &constants()).unwrap();
        assert_eq!(rec.ty.to_string(), "ImVector(u16)");
    }

    #[test]
    fn test_unknown_container_left_alone() {
        assert_eq!(
            expand_template("Other_int", "int", &["ImVector".to_string()]),
            "Other_int"
        );
        assert_eq!(
            expand_template("ImVector_float", "int", &["ImVector".to_string()]),
            "ImVector_float"
        );
    }

    #[test]
    fn test_array_suffix_moves_to_type() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);

        let mut f = field("Colors[ImGuiCol_COUNT]", "ImVec4");
        f.size = Some(53);
        let rec = canonicalize_field(&f, &canon, &constants()).unwrap();
        assert_eq!(rec.name, "Colors");
        assert_eq!(rec.ty.to_string(), "[ImGuiCol_COUNT]ImVec4");

        let mut f = field("TempBuffer[1024*3+1]", "char");
        f.size = Some(3073);
        let rec = canonicalize_field(&f, &canon, &constants()).unwrap();
        assert_eq!(rec.name, "TempBuffer");
        assert!(rec.ty.is_fixed_array());
    }

    #[test]
    fn test_size_mismatch_is_fatal() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);

        let mut f = field("Colors[ImGuiCol_COUNT]", "ImVec4");
        f.size = Some(54);
        let err = canonicalize_field(&f, &canon, &constants()).unwrap_err();
        assert!(err.is_fatal());

        let mut f = field("Keys[ImGuiKey_COUNT]", "bool");
        f.size = Some(512);
        let err = canonicalize_field(&f, &canon, &constants()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_bitfield() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let mut f = field("Flags", "unsigned int");
        f.bitfield = Some(NumberOrText::Text("8".to_string()));
        let rec = canonicalize_field(&f, &canon, &constants()).unwrap();
        assert_eq!(rec.bitfield, Some(8));
    }

    #[test]
    fn test_unbalanced_name() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let err = canonicalize_field(&field("Bad[3", "int"), &canon, &constants()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDeclaration { .. }));
    }

    #[test]
    fn test_struct_in_order() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let fields = vec![field("x", "float"), field("y", "float")];
        let records = canonicalize_struct(&fields, &canon, &constants()).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
    }
}
