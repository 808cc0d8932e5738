//! Function-pointer declarator grammar.
//!
//! Recognizes `<ret> (<cc>? * <name>?)(<args>)`, e.g.
//! `bool(*items_getter)(void* data,int idx,const char** out_text)` or the
//! demangler's `void * (__cdecl*)(unsigned __int64,void *)`.

use crate::split::matching_close;

/// Calling-convention tokens that may appear inside the declarator.
pub const CALLING_CONVENTIONS: &[&str] = &[
    "__cdecl",
    "__stdcall",
    "__fastcall",
    "__thiscall",
    "__vectorcall",
];

/// The pieces of a matched function-pointer declarator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionPointerDecl<'a> {
    /// Return type spelling.
    pub return_type: &'a str,
    /// Declarator name, if present.
    pub name: Option<&'a str>,
    /// Raw argument list between the final parentheses.
    pub args: &'a str,
}

/// Match a function-pointer declarator.
pub fn match_function_pointer(decl: &str) -> Option<FunctionPointerDecl<'_>> {
    let decl = decl.trim();
    let open = decl.find('(')?;
    let return_type = decl[..open].trim();
    if return_type.is_empty() {
        return None;
    }

    let close = matching_close(decl, open)?;
    let name = declarator_name(&decl[open + 1..close])?;

    let rest = &decl[close + 1..];
    let args_open = close + 1 + rest.find(|c: char| !c.is_whitespace())?;
    if decl.as_bytes()[args_open] != b'(' {
        return None;
    }
    let args_close = matching_close(decl, args_open)?;
    if args_close != decl.len() - 1 {
        return None;
    }

    Some(FunctionPointerDecl {
        return_type,
        name,
        args: &decl[args_open + 1..args_close],
    })
}

/// Parse `<cc>? * <name>?`. Outer None means "not a declarator";
/// inner None means "unnamed".
fn declarator_name(inner: &str) -> Option<Option<&str>> {
    let mut inner = inner.trim();
    for cc in CALLING_CONVENTIONS {
        if let Some(rest) = inner.strip_prefix(cc) {
            inner = rest.trim_start();
            break;
        }
    }
    let name = inner.strip_prefix('*')?.trim();
    if name.is_empty() {
        return Some(None);
    }
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(Some(name))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed() {
        let m = match_function_pointer("foo (*)(bar)").unwrap();
        assert_eq!(m.return_type, "foo");
        assert_eq!(m.name, None);
        assert_eq!(m.args, "bar");
    }

    #[test]
    fn test_calling_convention() {
        let m = match_function_pointer("foo(__cdecl*)(bar)").unwrap();
        assert_eq!(m.return_type, "foo");
        assert_eq!(m.args, "bar");

        let m = match_function_pointer("void * (__cdecl*)(unsigned __int64,void *)").unwrap();
        assert_eq!(m.return_type, "void *");
        assert_eq!(m.args, "unsigned __int64,void *");
    }

    #[test]
    fn test_named() {
        let m = match_function_pointer("*void(*alloc_func)(int bar)").unwrap();
        assert_eq!(m.return_type, "*void");
        assert_eq!(m.name, Some("alloc_func"));
        assert_eq!(m.args, "int bar");

        let m = match_function_pointer(
            "bool(*items_getter)(void* data,int idx,const char** out_text)",
        )
        .unwrap();
        assert_eq!(m.return_type, "bool");
        assert_eq!(m.name, Some("items_getter"));
        assert_eq!(m.args, "void* data,int idx,const char** out_text");
    }

    #[test]
    fn test_nested_args() {
        let m = match_function_pointer("void (*cb)(void (*inner)(int), int)").unwrap();
        assert_eq!(m.args, "void (*inner)(int), int");
    }

    #[test]
    fn test_rejects_non_declarators() {
        assert!(match_function_pointer("int").is_none());
        assert!(match_function_pointer("ImVec2(0,0)").is_none());
        assert!(match_function_pointer("(*)(int)").is_none());
        assert!(match_function_pointer("(data: *void) -> s32").is_none());
        assert!(match_function_pointer("void (*f)(int) const").is_none());
    }
}
