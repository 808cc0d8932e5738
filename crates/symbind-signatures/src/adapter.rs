//! Call-adapter planning.
//!
//! A resolved function can usually be called through its raw foreign
//! declaration. Some argument shapes cannot be expressed that way and need
//! a forwarding shim: string arguments with defaults, struct pointers
//! defaulted with a constructor call, `const T&` arguments, and fixed-size
//! arrays. The plan lists both parameter lists and how each argument is
//! forwarded from one to the other.

use crate::defaults::{DefaultKind, DefaultValue};
use crate::descriptor::FunctionDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use symbind_types::{ArgumentRecord, CanonicalType};

/// How a shim passes an externally-visible argument to the raw symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Forward {
    /// Pass the value through.
    Identity,
    /// Pass the backing buffer pointer (`.data`).
    BufferPointer,
    /// Pass the address of the by-value argument.
    AddressOf,
}

/// Why an argument needs a shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShimReason {
    StringDefault,
    ConstructorDefault,
    ConstReference,
    FixedArray,
}

impl fmt::Display for ShimReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShimReason::StringDefault => "string default",
            ShimReason::ConstructorDefault => "constructor default",
            ShimReason::ConstReference => "const reference",
            ShimReason::FixedArray => "fixed array",
        };
        f.write_str(s)
    }
}

/// Type of an externally-visible parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalType {
    Canonical(CanonicalType),
    /// A host-language string, passed to the raw symbol as a buffer.
    String,
}

impl fmt::Display for ExternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalType::Canonical(ty) => write!(f, "{}", ty),
            ExternalType::String => f.write_str("string"),
        }
    }
}

/// The plan for one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentPlan {
    pub name: String,
    /// Type of the externally-visible parameter.
    pub external: ExternalType,
    /// Type bound to the raw symbol.
    pub internal: CanonicalType,
    pub forward: Forward,
    /// Default on the externally-visible side.
    pub default: Option<String>,
    pub reason: Option<ShimReason>,
}

impl ArgumentPlan {
    fn identity(arg: &ArgumentRecord, default: Option<DefaultValue>) -> Self {
        Self {
            name: arg.name.clone(),
            external: ExternalType::Canonical(arg.ty.clone()),
            internal: arg.ty.clone(),
            forward: Forward::Identity,
            default: default.map(|d| d.text),
            reason: None,
        }
    }
}

/// The adapter plan for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterPlan {
    /// Whether any argument needs a shim.
    pub needs_shim: bool,
    pub args: Vec<ArgumentPlan>,
}

impl AdapterPlan {
    /// Build the plan for a descriptor. `diagnose` raises the per-argument
    /// decisions to `info`.
    pub fn for_descriptor(descriptor: &FunctionDescriptor, diagnose: bool) -> Self {
        let args: Vec<_> = descriptor
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let receiver = i == 0 && descriptor.has_implicit_self;
                let plan = plan_argument(arg, descriptor.default_for(&arg.name), receiver);
                match plan.reason {
                    Some(reason) => escalate!(
                        diagnose,
                        name = %descriptor.overload_name,
                        arg = %plan.name,
                        %reason,
                        forward = ?plan.forward,
                        "argument needs shim"
                    ),
                    None => escalate!(
                        diagnose,
                        name = %descriptor.overload_name,
                        arg = %plan.name,
                        "argument passed through"
                    ),
                }
                plan
            })
            .collect();
        let needs_shim = args.iter().any(|a| a.reason.is_some());
        Self { needs_shim, args }
    }

    /// Externally-visible parameters as `(name, type, default)`.
    pub fn external_params(&self) -> impl Iterator<Item = (&str, &ExternalType, Option<&str>)> {
        self.args
            .iter()
            .map(|a| (a.name.as_str(), &a.external, a.default.as_deref()))
    }

    /// Parameters bound to the raw symbol.
    pub fn internal_params(&self) -> impl Iterator<Item = (&str, &CanonicalType)> {
        self.args.iter().map(|a| (a.name.as_str(), &a.internal))
    }
}

/// Decide how one argument is passed. The first matching trigger wins.
pub fn plan_argument(arg: &ArgumentRecord, default: Option<DefaultValue>, receiver: bool) -> ArgumentPlan {
    if receiver || arg.is_variadic() {
        return ArgumentPlan::identity(arg, default);
    }

    if let Some(value) = &default {
        if arg.ty.is_string() {
            let text = match value.kind {
                DefaultKind::Null => "\"\"".to_string(),
                _ => value.text.clone(),
            };
            return ArgumentPlan {
                name: arg.name.clone(),
                external: ExternalType::String,
                internal: arg.ty.clone(),
                forward: Forward::BufferPointer,
                default: Some(text),
                reason: Some(ShimReason::StringDefault),
            };
        }

        if value.is_constructor() && !arg.is_function_pointer() && arg.ty.indirection_depth() == 1 {
            if let CanonicalType::Pointer(pointee) = &arg.ty {
                if matches!(**pointee, CanonicalType::Named(_)) {
                    return by_value(arg, pointee, default, ShimReason::ConstructorDefault);
                }
            }
        }
    }

    if arg.is_const_ref {
        if let Some(pointee) = arg.ty.strip_indirection() {
            return by_value(arg, pointee, default, ShimReason::ConstReference);
        }
    }

    if let CanonicalType::FixedArray(array) = &arg.ty {
        return ArgumentPlan {
            name: arg.name.clone(),
            external: ExternalType::Canonical(arg.ty.clone()),
            internal: CanonicalType::pointer_to((*array.element).clone()),
            forward: Forward::BufferPointer,
            default: default.map(|d| d.text),
            reason: Some(ShimReason::FixedArray),
        };
    }

    ArgumentPlan::identity(arg, default)
}

fn by_value(
    arg: &ArgumentRecord,
    pointee: &CanonicalType,
    default: Option<DefaultValue>,
    reason: ShimReason,
) -> ArgumentPlan {
    ArgumentPlan {
        name: arg.name.clone(),
        external: ExternalType::Canonical(pointee.clone()),
        internal: arg.ty.clone(),
        forward: Forward::AddressOf,
        default: default.map(|d| d.text),
        reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbind_types::{parse_argument, Canonicalizer, Primitive, TypeConfig};

    fn plan(decl: &str) -> ArgumentPlan {
        let config = TypeConfig::imgui();
        let arg = parse_argument(decl, 0, &Canonicalizer::new(&config)).unwrap();
        let default = arg.default.as_deref().map(DefaultValue::parse);
        plan_argument(&arg, default, false)
    }

    #[test]
    fn test_plain_argument_is_identity() {
        let p = plan("int count");
        assert_eq!(p.forward, Forward::Identity);
        assert_eq!(p.reason, None);
        assert_eq!(p.external, ExternalType::Canonical(CanonicalType::primitive(Primitive::S32)));
    }

    #[test]
    fn test_const_ref_with_constructor_default() {
        let p = plan("const ImVec2& size = ImVec2(0,0)");
        assert_eq!(p.name, "size");
        assert_eq!(p.forward, Forward::AddressOf);
        assert_eq!(p.external, ExternalType::Canonical(CanonicalType::named("ImVec2")));
        assert_eq!(p.internal, CanonicalType::pointer_to(CanonicalType::named("ImVec2")));
        assert_eq!(p.default.as_deref(), Some("ImVec2(0,0)"));
        assert_eq!(p.reason, Some(ShimReason::ConstructorDefault));
    }

    #[test]
    fn test_const_ref_without_default() {
        let p = plan("const ImVec4& col");
        assert_eq!(p.forward, Forward::AddressOf);
        assert_eq!(p.reason, Some(ShimReason::ConstReference));
        assert_eq!(p.external.to_string(), "ImVec4");
    }

    #[test]
    fn test_string_default() {
        let p = plan("const char* format = \"%.3f\"");
        assert_eq!(p.external, ExternalType::String);
        assert_eq!(p.forward, Forward::BufferPointer);
        assert_eq!(p.default.as_deref(), Some("\"%.3f\""));
        assert_eq!(p.reason, Some(ShimReason::StringDefault));

        let p = plan("const char* label_end = NULL");
        assert_eq!(p.default.as_deref(), Some("\"\""));
    }

    #[test]
    fn test_string_without_default_is_identity() {
        let p = plan("const char* label");
        assert_eq!(p.forward, Forward::Identity);
    }

    #[test]
    fn test_fixed_array() {
        let p = plan("float col[4]");
        assert_eq!(p.forward, Forward::BufferPointer);
        assert_eq!(p.internal, CanonicalType::pointer_to(CanonicalType::primitive(Primitive::Float32)));
        assert_eq!(p.external.to_string(), "[4]float32");
        assert_eq!(p.reason, Some(ShimReason::FixedArray));
    }

    #[test]
    fn test_constructor_default_needs_struct_pointee() {
        let p = plan("ImVec2* pos = ImVec2(0,0)");
        assert_eq!(p.forward, Forward::AddressOf);
        assert_eq!(p.reason, Some(ShimReason::ConstructorDefault));

        let p = plan("int* p = Foo()");
        assert_eq!(p.forward, Forward::Identity);
        assert_eq!(p.reason, None);
        assert_eq!(p.internal, CanonicalType::pointer_to(CanonicalType::primitive(Primitive::S32)));
    }

    #[test]
    fn test_numeric_default_is_identity() {
        let p = plan("float speed = 1.0f");
        assert_eq!(p.forward, Forward::Identity);
        assert_eq!(p.default.as_deref(), Some("1.0f"));
    }

    #[test]
    fn test_function_descriptor_plan() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let entry: crate::manifest::DefinitionEntry = serde_json::from_str(
            r#"{
                "funcname": "Button", "namespace": "ImGui",
                "argsT": [{"name": "label", "type": "const char*"}, {"name": "size", "type": "const ImVec2"}],
                "argsoriginal": "(const char* label,const ImVec2& size=ImVec2(0,0))",
                "defaults": {"size": "ImVec2(0,0)"},
                "ret": "bool"
            }"#,
        )
        .unwrap();
        let descriptor = FunctionDescriptor::from_entry(&entry, &canon).unwrap();
        let plan = AdapterPlan::for_descriptor(&descriptor, false);
        assert!(plan.needs_shim);
        assert_eq!(plan.args[0].forward, Forward::Identity);
        assert_eq!(plan.args[1].forward, Forward::AddressOf);

        let external: Vec<_> = plan.external_params().map(|(n, t, _)| (n, t.to_string())).collect();
        assert_eq!(external, [("label", "*u8".to_string()), ("size", "ImVec2".to_string())]);
        let internal: Vec<_> = plan.internal_params().map(|(_, t)| t.to_string()).collect();
        assert_eq!(internal, ["*u8", "*ImVec2"]);
    }

    #[test]
    fn test_receiver_is_identity() {
        let config = TypeConfig::imgui();
        let canon = Canonicalizer::new(&config);
        let arg = parse_argument("const ImVec2& self", 0, &canon).unwrap();
        let p = plan_argument(&arg, None, true);
        assert_eq!(p.forward, Forward::Identity);
    }
}
