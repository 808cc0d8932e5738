//! Property-based tests for export listings and display names.
//!
//! These tests verify that the parsers handle arbitrary input safely and
//! recover the parts of well-formed symbols.

use proptest::prelude::*;

use symbind_demangle::{
    has_calling_convention, parse_export_dump, parse_export_line, parse_symbol, SymbolIndex,
    SymbolRecord,
};
use symbind_types::{Canonicalizer, TypeConfig};

fn record(display: &str) -> SymbolRecord {
    SymbolRecord {
        ordinal: 1,
        hint: 0,
        address: 0,
        mangled: "?x@@".to_string(),
        demangled: display.to_string(),
    }
}

// =============================================================================
// Safety Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10000))]

    /// Parsing arbitrary display strings never panics.
    #[test]
    fn parse_symbol_never_panics(s in ".*") {
        let config = TypeConfig::imgui();
        let _ = parse_symbol(&record(&s), &Canonicalizer::new(&config));
    }

    /// Display strings built from the grammar's alphabet never panic.
    #[test]
    fn parse_symbol_grammar_alphabet(s in "[a-zA-Z_:*&(), <>~=]{0,60}") {
        let config = TypeConfig::imgui();
        let _ = parse_symbol(&record(&format!("void __cdecl {}", s)), &Canonicalizer::new(&config));
    }

    /// Parsing arbitrary export lines never panics.
    #[test]
    fn parse_export_line_never_panics(s in ".*") {
        let _ = parse_export_line(&s);
    }

    /// Parsing arbitrary listings never panics.
    #[test]
    fn parse_export_dump_never_panics(s in "(ordinal\n)?[ -~\n]{0,200}") {
        let _ = parse_export_dump(&s);
    }
}

// =============================================================================
// Determinism Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5000))]

    /// Parsing is deterministic.
    #[test]
    fn parse_symbol_is_deterministic(s in ".*") {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        prop_assert_eq!(parse_symbol(&record(&s), &canon), parse_symbol(&record(&s), &canon));
    }

    /// Without a calling convention nothing is indexed.
    #[test]
    fn unmarked_records_are_skipped(s in "[a-zA-Z_ *()]{0,40}") {
        prop_assume!(!has_calling_convention(&s));
        let config = TypeConfig::imgui();
        let index = SymbolIndex::build(&[record(&s)], &Canonicalizer::new(&config));
        prop_assert!(index.is_empty());
        prop_assert_eq!(index.diagnostics().skipped, 1);
    }
}

// =============================================================================
// Well-Formed Symbol Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Owner, name and arity are recovered from generated symbols.
    #[test]
    fn generated_symbols_roundtrip(
        owner in prop::option::of("[A-Z][a-zA-Z0-9]{0,10}"),
        name in "[A-Z][a-zA-Z0-9_]{0,15}",
        args in prop::collection::vec(
            prop::sample::select(vec!["int", "float", "char const *", "struct ImVec2 const &", "void *", "unsigned __int64"]),
            0..5,
        ),
        is_const in any::<bool>(),
    ) {
        let qualified = match &owner {
            Some(o) => format!("{}::{}", o, name),
            None => name.clone(),
        };
        let arg_list = if args.is_empty() { "void".to_string() } else { args.join(",") };
        let display = format!(
            "public: bool __cdecl {}({}){}",
            qualified,
            arg_list,
            if is_const { "const" } else { "" }
        );

        let config = TypeConfig::imgui();
        let sym = parse_symbol(&record(&display), &Canonicalizer::new(&config)).unwrap();
        prop_assert_eq!(sym.owner, owner);
        prop_assert_eq!(sym.name, name);
        prop_assert_eq!(sym.params.len(), args.len());
        prop_assert_eq!(sym.is_const, is_const);
    }

    /// Well-formed export lines keep their fields.
    #[test]
    fn generated_export_lines_parse(
        ordinal in 1u32..100_000,
        hint in 0u32..0xFFFF,
        rva in 0u64..0xFFFF_FFFF,
        mangled in "\\?[A-Za-z0-9@_]{1,30}",
    ) {
        let line = format!(
            "{:>10} {:>4X} {:08X} {} = {} (void __cdecl Foo(void))",
            ordinal, hint, rva, mangled, mangled
        );
        let rec = parse_export_line(&line).unwrap();
        prop_assert_eq!(rec.ordinal, ordinal);
        prop_assert_eq!(rec.hint, hint);
        prop_assert_eq!(rec.address, rva);
        prop_assert_eq!(rec.mangled, mangled);
        prop_assert_eq!(rec.demangled, "void __cdecl Foo(void)");
    }
}
