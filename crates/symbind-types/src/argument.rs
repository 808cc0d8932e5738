//! Manifest argument declarations.
//!
//! One declaration is one comma-separated piece of an `argsoriginal` list,
//! for example `const ImVec2& size=ImVec2(0,0)`,
//! `bool(*items_getter)(void* data,int idx,const char** out_text)` or `...`.

use crate::fnptr::match_function_pointer;
use crate::parser::{Canonicalizer, ParseError, ParseResult};
use crate::split::{find_top_level, matching_open};
use crate::types::CanonicalType;
use serde::{Deserialize, Serialize};

/// A parsed argument declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentRecord {
    /// Declared name, or `unnamed<index>` when absent.
    pub name: String,
    /// Type spelling with the name and default removed.
    pub raw_type: String,
    /// Canonical form of `raw_type`.
    pub ty: CanonicalType,
    /// Default-value text as written.
    pub default: Option<String>,
    /// Declared as `const T&`.
    pub is_const_ref: bool,
}

impl ArgumentRecord {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>, ty: CanonicalType) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            ty,
            default: None,
            is_const_ref: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_fixed_array(&self) -> bool {
        self.ty.is_fixed_array()
    }

    pub fn is_function_pointer(&self) -> bool {
        self.ty.is_function_pointer()
    }

    pub fn is_variadic(&self) -> bool {
        self.ty == CanonicalType::Variadic
    }
}

/// Synthesized name for the argument at `index`.
pub fn unnamed(index: usize) -> String {
    format!("unnamed{}", index)
}

/// Parse one argument declaration.
///
/// Grammar failures come back as [`ParseError::MalformedDeclaration`];
/// fatal errors from the canonicalizer pass through unchanged.
pub fn parse_argument(
    decl: &str,
    index: usize,
    canon: &Canonicalizer<'_>,
) -> ParseResult<ArgumentRecord> {
    let malformed = |reason: String| ParseError::MalformedDeclaration {
        text: decl.to_string(),
        reason,
    };

    let (head, default) = match find_top_level(decl, '=') {
        Some(eq) => (&decl[..eq], Some(decl[eq + 1..].trim().to_string())),
        None => (decl, None),
    };
    let head = head.trim();
    if head.is_empty() {
        return Err(malformed("empty declaration".to_string()));
    }
    if default.as_deref() == Some("") {
        return Err(malformed("empty default value".to_string()));
    }

    let canonicalize = |spelling: &str| {
        canon.canonicalize(spelling).map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                malformed(e.to_string())
            }
        })
    };

    if head == "..." {
        return Ok(ArgumentRecord {
            name: "args".to_string(),
            raw_type: head.to_string(),
            ty: CanonicalType::Variadic,
            default,
            is_const_ref: false,
        });
    }

    if let Some(fp) = match_function_pointer(head) {
        let name = fp.name.map(str::to_string).unwrap_or_else(|| unnamed(index));
        return Ok(ArgumentRecord {
            name,
            raw_type: head.to_string(),
            ty: canonicalize(head)?,
            default,
            is_const_ref: false,
        });
    }

    // `float col[4]`: peel the array suffix off before finding the name.
    let mut declarator = head;
    while declarator.ends_with(']') {
        let open = matching_open(declarator, declarator.len() - 1)
            .ok_or_else(|| malformed("unbalanced array suffix".to_string()))?;
        declarator = declarator[..open].trim_end();
    }
    let array_suffix = &head[declarator.len()..];

    let (type_text, name) = match split_declarator_name(declarator, canon) {
        Some((ty, name)) => (format!("{}{}", ty, array_suffix), name.to_string()),
        None => (head.to_string(), unnamed(index)),
    };

    let ty = canonicalize(&type_text)?;
    Ok(ArgumentRecord {
        name,
        is_const_ref: is_const_reference(&type_text),
        raw_type: type_text,
        ty,
        default,
    })
}

/// Split `type name` into its parts.
///
/// The trailing identifier is a name only when something other than
/// qualifiers precedes it and it is not itself a primitive type word, so
/// `unsigned int` and `const Foo` stay unnamed.
fn split_declarator_name<'a>(
    declarator: &'a str,
    canon: &Canonicalizer<'_>,
) -> Option<(&'a str, &'a str)> {
    let start = declarator
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let name = &declarator[start..];
    let ty = declarator[..start].trim_end();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let config = canon.config();
    if config.primitives.is_type_word(name) || is_qualifier_word(name) {
        return None;
    }

    let has_type = ty.contains(['*', '&'])
        || ty
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|word| !word.is_empty() && !is_qualifier_word(word));
    if !has_type || ty.ends_with("::") {
        return None;
    }
    Some((ty, name))
}

fn is_qualifier_word(word: &str) -> bool {
    matches!(
        word,
        "const" | "volatile" | "struct" | "class" | "union" | "enum" | "typename"
    )
}

/// `const T&` with exactly one level of indirection.
fn is_const_reference(type_text: &str) -> bool {
    let text = type_text.trim_end();
    text.ends_with('&')
        && text.matches(['*', '&']).count() == 1
        && text
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|w| w == "const")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfig;
    use crate::types::{FunctionParam, Primitive};

    fn parse(decl: &str, index: usize) -> ArgumentRecord {
        let config = TypeConfig::imgui();
        parse_argument(decl, index, &Canonicalizer::new(&config)).unwrap()
    }

    #[test]
    fn test_type_and_name() {
        let arg = parse("const char* label", 0);
        assert_eq!(arg.name, "label");
        assert_eq!(arg.raw_type, "const char*");
        assert!(arg.ty.is_string());
        assert_eq!(arg.default, None);
    }

    #[test]
    fn test_default_value() {
        let arg = parse("ImGuiDockNodeFlags flags=0", 2);
        assert_eq!(arg.name, "flags");
        assert_eq!(arg.ty, CanonicalType::named("DockNodeFlags"));
        assert_eq!(arg.default.as_deref(), Some("0"));

        let arg = parse("const ImVec2& size=ImVec2(0,0)", 1);
        assert_eq!(arg.name, "size");
        assert!(arg.is_const_ref);
        assert_eq!(arg.default.as_deref(), Some("ImVec2(0,0)"));
        assert_eq!(arg.ty, CanonicalType::pointer_to(CanonicalType::named("ImVec2")));
    }

    #[test]
    fn test_array_suffix_moves_to_type() {
        let arg = parse("float col[4]", 0);
        assert_eq!(arg.name, "col");
        assert_eq!(arg.raw_type, "float[4]");
        assert!(arg.is_fixed_array());
        assert_eq!(arg.ty.to_string(), "[4]float32");

        let arg = parse("const char* items[]", 1);
        assert_eq!(arg.name, "items");
        assert_eq!(arg.ty.to_string(), "**u8");
    }

    #[test]
    fn test_unnamed() {
        let arg = parse("int", 3);
        assert_eq!(arg.name, "unnamed3");
        assert_eq!(arg.ty, CanonicalType::primitive(Primitive::S32));

        assert_eq!(parse("unsigned int", 0).name, "unnamed0");
        assert_eq!(parse("const ImVec2&", 1).name, "unnamed1");
        assert_eq!(parse("char const* *", 2).name, "unnamed2");
        assert_eq!(parse("struct ImGuiWindow", 0).name, "unnamed0");
    }

    #[test]
    fn test_function_pointer_argument() {
        let arg = parse(
            "bool(*items_getter)(void* data,int idx,const char** out_text)",
            2,
        );
        assert_eq!(arg.name, "items_getter");
        assert!(arg.is_function_pointer());
        assert_eq!(
            arg.ty,
            CanonicalType::function_pointer(
                CanonicalType::primitive(Primitive::Bool),
                vec![
                    FunctionParam::new("data", CanonicalType::pointer_to(CanonicalType::void())),
                    FunctionParam::new("idx", CanonicalType::primitive(Primitive::S32)),
                    FunctionParam::new(
                        "out_text",
                        CanonicalType::pointer_to(CanonicalType::pointer_to(
                            CanonicalType::primitive(Primitive::U8)
                        ))
                    ),
                ]
            )
        );

        let arg = parse("void (*)(int)", 4);
        assert_eq!(arg.name, "unnamed4");
    }

    #[test]
    fn test_variadic() {
        let arg = parse("...", 1);
        assert_eq!(arg.name, "args");
        assert!(arg.is_variadic());
    }

    #[test]
    fn test_const_reference_flag() {
        assert!(parse("const ImVec4& col", 0).is_const_ref);
        assert!(parse("ImVec4 const& col", 0).is_const_ref);
        assert!(!parse("ImVec4& col", 0).is_const_ref);
        assert!(!parse("const ImVec4* col", 0).is_const_ref);
    }

    #[test]
    fn test_malformed() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        for decl in ["", "  ", "=3", "int x=", "int @x", "float col[4"] {
            let err = parse_argument(decl, 0, &canon).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedDeclaration { .. }),
                "{:?}: {:?}",
                decl,
                err
            );
        }
    }
}
