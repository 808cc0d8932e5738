//! Default-value classification.

use serde::{Deserialize, Serialize};

/// The shape of a default-value expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultKind {
    /// `NULL`, `nullptr`, `((void*)0)`.
    Null,
    /// Integer or floating-point literal, possibly signed or suffixed.
    Number,
    /// `Name(args)`, e.g. `ImVec2(0,0)`.
    Constructor { name: String, args: String },
    /// `sizeof(T)`.
    SizeOf { operand: String },
    /// Anything else: enum constants, macros, casts, string literals.
    Text,
}

/// A default value as written, with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub text: String,
    pub kind: DefaultKind,
}

impl DefaultValue {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        Self {
            text: text.to_string(),
            kind: classify(text),
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == DefaultKind::Null
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, DefaultKind::Constructor { .. })
    }
}

fn classify(text: &str) -> DefaultKind {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if matches!(compact.as_str(), "NULL" | "nullptr" | "((void*)0)" | "(void*)0") {
        return DefaultKind::Null;
    }
    if is_number(text) {
        return DefaultKind::Number;
    }
    if let Some((name, args)) = call_shape(text) {
        if name == "sizeof" {
            return DefaultKind::SizeOf {
                operand: args.to_string(),
            };
        }
        return DefaultKind::Constructor {
            name: name.to_string(),
            args: args.to_string(),
        };
    }
    DefaultKind::Text
}

/// `-1`, `0.0f`, `1e+30f`, `0x80`, `16u`.
fn is_number(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let hex = hex.trim_end_matches(['u', 'U', 'l', 'L']);
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let body = body.trim_end_matches(['f', 'F', 'u', 'U', 'l', 'L']);
    !body.is_empty()
        && body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.parse::<f64>().is_ok()
}

/// `name(args)` where the parentheses enclose the rest of the text.
fn call_shape(text: &str) -> Option<(&str, &str)> {
    let open = text.find('(')?;
    let name = text[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let inner = text[open + 1..].strip_suffix(')')?;
    // `f(a)(b)` is not a single call.
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some((name, inner))
}
