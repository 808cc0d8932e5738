//! Property-based tests for manifest handling and resolution.
//!
//! These tests verify that default classification and argument-list
//! parsing never panic, and that generated manifest entries bind to the
//! symbols generated alongside them.

use proptest::prelude::*;

use symbind_demangle::{SymbolIndex, SymbolRecord};
use symbind_signatures::descriptor::parse_argument_list;
use symbind_signatures::{
    bind, AdapterPlan, DefaultKind, DefaultValue, DefinitionEntry, FunctionDescriptor, Manifest, ResolverConfig,
};
use symbind_types::{Canonicalizer, TypeConfig};

// =============================================================================
// Strategies
// =============================================================================

/// (manifest spelling, display spelling) pairs denoting the same type.
fn arg_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop::sample::select(vec![
        ("int", "int"),
        ("unsigned int", "unsigned int"),
        ("float", "float"),
        ("const char*", "char const *"),
        ("bool*", "bool *"),
        ("ImU32", "unsigned int"),
        ("const ImVec2&", "struct ImVec2 const &"),
        ("ImGuiID", "unsigned int"),
        ("void*", "void *"),
        ("double", "double"),
    ])
}

// =============================================================================
// Safety Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10000))]

    /// Classifying arbitrary default text never panics.
    #[test]
    fn default_classification_never_panics(s in ".*") {
        let _ = DefaultValue::parse(&s);
    }

    /// Integer literals classify as numbers.
    #[test]
    fn integer_defaults_are_numbers(n in any::<i32>()) {
        prop_assert_eq!(DefaultValue::parse(&n.to_string()).kind, DefaultKind::Number);
    }

    /// Parsing arbitrary argument lists never panics.
    #[test]
    fn argument_list_never_panics(s in "[a-zA-Z_0-9*&(),=<> \\[\\].]{0,60}") {
        let config = TypeConfig::imgui();
        let _ = parse_argument_list(&format!("({})", s), &Canonicalizer::new(&config));
    }

    /// Manifest JSON of any shape is rejected or accepted, never a panic.
    #[test]
    fn manifest_json_never_panics(s in ".{0,100}") {
        let _ = Manifest::from_json(&s);
    }
}

// =============================================================================
// Binding Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A generated entry binds to the symbol generated from the same types.
    #[test]
    fn generated_entries_bind(
        name in "[A-Z][a-zA-Z]{0,12}",
        args in prop::collection::vec(arg_pair(), 0..5),
    ) {
        let manifest_args: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(i, (ty, _))| format!("{} a{}", ty, i))
            .collect();
        let display_args = if args.is_empty() {
            "void".to_string()
        } else {
            args.iter().map(|(_, ty)| *ty).collect::<Vec<_>>().join(",")
        };

        let group = format!("ig{}", name);
        let json = serde_json::json!({
            group: [{
                "funcname": name,
                "namespace": "ImGui",
                "cimguiname": format!("ig{}", name),
                "argsoriginal": format!("({})", manifest_args.join(",")),
                "ret": "void"
            }]
        });
        let manifest = Manifest::from_json(&json.to_string()).unwrap();

        let mangled = format!("?{}@ImGui@@YAXXZ", name);
        let record = SymbolRecord {
            ordinal: 1,
            hint: 0,
            address: 0x1000,
            mangled: mangled.clone(),
            demangled: format!("void __cdecl ImGui::{}({})", name, display_args),
        };

        let types = TypeConfig::imgui();
        let index = SymbolIndex::build(&[record], &Canonicalizer::new(&types));
        let report = bind(&manifest, &index, &types, &ResolverConfig::default()).unwrap();

        prop_assert_eq!(report.bindings.len(), 1);
        prop_assert_eq!(report.bindings[0].mangled(), mangled.as_str());
        prop_assert_eq!(report.diagnostics.unresolved(), 0);
    }

    /// The adapter plan keeps one entry per argument, in order.
    #[test]
    fn plan_covers_every_argument(args in prop::collection::vec(arg_pair(), 0..6)) {
        let original: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(i, (ty, _))| format!("{} a{}", ty, i))
            .collect();
        let entry: DefinitionEntry = serde_json::from_value(serde_json::json!({
            "funcname": "F",
            "argsoriginal": format!("({})", original.join(",")),
        }))
        .unwrap();

        let types = TypeConfig::imgui();
        let descriptor = FunctionDescriptor::from_entry(&entry, &Canonicalizer::new(&types)).unwrap();
        let plan = AdapterPlan::for_descriptor(&descriptor, false);

        prop_assert_eq!(plan.args.len(), args.len());
        for (i, arg) in plan.args.iter().enumerate() {
            prop_assert_eq!(&arg.name, &format!("a{}", i));
        }
        let has_const_ref = args.iter().any(|(ty, _)| ty.ends_with('&'));
        prop_assert_eq!(plan.needs_shim, has_const_ref);
    }
}
