//! Demangled display-name grammar.
//!
//! ```text
//! display  := [visibility ': '] storage* return cc [owner '::'] name '(' args ')' ['const']
//! storage  := 'static' | 'virtual'
//! cc       := '__cdecl' | '__stdcall' | '__fastcall' | '__thiscall' | '__vectorcall'
//! ```
//!
//! Only the calling-convention marker at parenthesis depth zero separates
//! the return type from the name, so function-pointer arguments carrying
//! their own `__cdecl` do not confuse the split.

use crate::export::SymbolRecord;
use crate::DemangleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use symbind_types::split::{matching_open, split_args};
use symbind_types::{CanonicalType, Canonicalizer, CALLING_CONVENTIONS};

/// Member visibility prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// A parsed exported function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDescriptor {
    pub mangled: String,
    pub visibility: Option<Visibility>,
    /// Namespace or struct qualifier, as written.
    pub owner: Option<String>,
    /// Bare function name, including operator spellings.
    pub name: String,
    pub params: Vec<CanonicalType>,
    pub return_type: CanonicalType,
    /// Trailing `const` on a member function.
    pub is_const: bool,
    /// `static` member function.
    pub is_static: bool,
    pub ordinal: u32,
    /// Original display string.
    pub display: String,
}

impl SymbolDescriptor {
    /// Non-static member functions receive an implicit `this`.
    pub fn has_receiver(&self) -> bool {
        self.visibility.is_some() && !self.is_static
    }

    /// `Owner::name`, or just the name.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// Whether the display string carries any calling-convention marker.
pub fn has_calling_convention(display: &str) -> bool {
    CALLING_CONVENTIONS.iter().any(|cc| contains_word(display, cc))
}

/// Parse one export record into a descriptor.
///
/// Records without a calling-convention marker are not functions of the
/// exported API and yield [`DemangleError::NotExported`].
pub fn parse_symbol(
    record: &SymbolRecord,
    canon: &Canonicalizer<'_>,
) -> Result<SymbolDescriptor, DemangleError> {
    let display = record.demangled.trim();
    if !has_calling_convention(display) {
        return Err(DemangleError::NotExported(display.to_string()));
    }
    let malformed = |reason: &str| DemangleError::Malformed {
        display: display.to_string(),
        reason: reason.to_string(),
    };

    let (visibility, mut rest) = match display.split_once(": ") {
        Some((word, rest)) => match Visibility::from_word(word) {
            Some(v) => (Some(v), rest),
            None => (None, display),
        },
        None => (None, display),
    };
    let mut is_static = false;
    loop {
        let trimmed = rest.trim_start();
        if let Some(next) = trimmed.strip_prefix("static ") {
            is_static = true;
            rest = next;
        } else if let Some(next) = trimmed.strip_prefix("virtual ") {
            rest = next;
        } else {
            rest = trimmed;
            break;
        }
    }

    let mut body = rest.trim_end();
    let mut is_const = false;
    if let Some(before) = body.strip_suffix("const") {
        if before.trim_end().ends_with(')') {
            is_const = true;
            body = before.trim_end();
        }
    }

    if !body.ends_with(')') {
        return Err(malformed("missing argument list"));
    }
    let args_open = matching_open(body, body.len() - 1)
        .ok_or_else(|| malformed("unbalanced argument list"))?;
    let args = &body[args_open + 1..body.len() - 1];
    let head = &body[..args_open];

    let (return_text, qualified) =
        split_at_convention(head).ok_or_else(|| malformed("no top-level calling convention"))?;
    let (owner, name) = split_owner(qualified);
    if name.is_empty() {
        return Err(malformed("empty function name"));
    }

    let return_type = if return_text.is_empty() {
        // Constructors and destructors.
        CanonicalType::void()
    } else {
        canon.canonicalize(return_text)?
    };

    let pieces = split_args(args);
    let mut params = Vec::with_capacity(pieces.len());
    if !(pieces.len() == 1 && matches!(pieces[0].trim(), "" | "void")) {
        for piece in pieces {
            params.push(canon.canonicalize(piece)?);
        }
    }

    Ok(SymbolDescriptor {
        mangled: record.mangled.clone(),
        visibility,
        owner: owner.map(str::to_string),
        name: name.to_string(),
        params,
        return_type,
        is_const,
        is_static,
        ordinal: record.ordinal,
        display: display.to_string(),
    })
}

/// Split `head` at the first calling-convention word outside parentheses.
fn split_at_convention(head: &str) -> Option<(&str, &str)> {
    let mut depth: i32 = 0;
    let bytes = head.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ if depth == 0 => {
                for cc in CALLING_CONVENTIONS {
                    if bytes[i..].starts_with(cc.as_bytes()) && is_word_boundary(head, i, cc.len()) {
                        return Some((head[..i].trim(), head[i + cc.len()..].trim()));
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `Owner::name` on the last `::` outside template brackets.
fn split_owner(qualified: &str) -> (Option<&str>, &str) {
    let bytes = qualified.as_bytes();
    let mut depth: i32 = 0;
    let mut split = None;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                if i == 0 || bytes[i - 1] != b':' {
                    split = Some(i);
                }
            }
            _ => {}
        }
    }
    match split {
        Some(i) => (Some(qualified[..i].trim()), qualified[i + 2..].trim()),
        None => (None, qualified.trim()),
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .match_indices(word)
        .any(|(i, _)| is_word_boundary(haystack, i, word.len()))
}

fn is_word_boundary(s: &str, start: usize, len: usize) -> bool {
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let bytes = s.as_bytes();
    let before = start == 0 || !is_ident(bytes[start - 1]);
    let after = start + len >= bytes.len() || !is_ident(bytes[start + len]);
    before && after
}
