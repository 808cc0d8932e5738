//! Canonical type representation.
//!
//! This module defines the language-neutral type descriptor every raw C
//! spelling is normalized into before comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-width primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    Float32,
    Float64,
    Bool,
    Void,
}

impl Primitive {
    /// All primitives, in canonical-name order.
    pub const ALL: [Primitive; 12] = [
        Primitive::U8,
        Primitive::S8,
        Primitive::U16,
        Primitive::S16,
        Primitive::U32,
        Primitive::S32,
        Primitive::U64,
        Primitive::S64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Bool,
        Primitive::Void,
    ];

    /// Get the canonical spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::S8 => "s8",
            Primitive::U16 => "u16",
            Primitive::S16 => "s16",
            Primitive::U32 => "u32",
            Primitive::S32 => "s32",
            Primitive::U64 => "u64",
            Primitive::S64 => "s64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Bool => "bool",
            Primitive::Void => "void",
        }
    }

    /// Look up a primitive by its canonical spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Size in bytes. None for void.
    pub fn size(&self) -> Option<usize> {
        match self {
            Primitive::U8 | Primitive::S8 | Primitive::Bool => Some(1),
            Primitive::U16 | Primitive::S16 => Some(2),
            Primitive::U32 | Primitive::S32 | Primitive::Float32 => Some(4),
            Primitive::U64 | Primitive::S64 | Primitive::Float64 => Some(8),
            Primitive::Void => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            Primitive::Float32 | Primitive::Float64 | Primitive::Bool | Primitive::Void
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A canonical type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalType {
    /// Fixed-width primitive.
    Primitive(Primitive),

    /// Pointer (or reference) to another type.
    Pointer(Box<CanonicalType>),

    /// Fixed-size array. The size is kept as the original expression text.
    FixedArray(ArrayType),

    /// Function pointer with named parameters.
    FunctionPointer(FunctionPointerType),

    /// Any other identifier (struct, enum, typedef).
    Named(String),

    /// Whitelisted single-parameter container template, e.g. `ImVector<T>`.
    Container(ContainerType),

    /// C variadic marker `...`.
    Variadic,
}

/// Fixed-size array details.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayType {
    /// Element type.
    pub element: Box<CanonicalType>,
    /// Size expression exactly as written (`4`, `ImGuiKey_COUNT`, `1024*3+1`).
    pub size: String,
}

/// Function pointer details.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionPointerType {
    pub return_type: Box<CanonicalType>,
    pub params: Vec<FunctionParam>,
}

/// A named function-pointer parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    pub ty: CanonicalType,
}

/// Container template details.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerType {
    pub name: String,
    pub element: Box<CanonicalType>,
}

impl CanonicalType {
    pub fn primitive(p: Primitive) -> Self {
        CanonicalType::Primitive(p)
    }

    pub fn void() -> Self {
        CanonicalType::Primitive(Primitive::Void)
    }

    pub fn named(name: impl Into<String>) -> Self {
        CanonicalType::Named(name.into())
    }

    pub fn pointer_to(inner: CanonicalType) -> Self {
        CanonicalType::Pointer(Box::new(inner))
    }

    pub fn array_of(element: CanonicalType, size: impl Into<String>) -> Self {
        CanonicalType::FixedArray(ArrayType {
            element: Box::new(element),
            size: size.into(),
        })
    }

    pub fn function_pointer(return_type: CanonicalType, params: Vec<FunctionParam>) -> Self {
        CanonicalType::FunctionPointer(FunctionPointerType {
            return_type: Box::new(return_type),
            params,
        })
    }

    /// Check if this is void.
    pub fn is_void(&self) -> bool {
        matches!(self, CanonicalType::Primitive(Primitive::Void))
    }

    /// Check if this is a pointer.
    pub fn is_pointer(&self) -> bool {
        matches!(self, CanonicalType::Pointer(_))
    }

    pub fn is_fixed_array(&self) -> bool {
        matches!(self, CanonicalType::FixedArray(_))
    }

    pub fn is_function_pointer(&self) -> bool {
        matches!(self, CanonicalType::FunctionPointer(_))
    }

    /// Check if this is a pointer to 8-bit character data.
    pub fn is_string(&self) -> bool {
        matches!(self, CanonicalType::Pointer(inner) if **inner == CanonicalType::Primitive(Primitive::U8))
    }

    /// The type one pointer or array level down, if any.
    pub fn strip_indirection(&self) -> Option<&CanonicalType> {
        match self {
            CanonicalType::Pointer(inner) => Some(inner),
            CanonicalType::FixedArray(a) => Some(&a.element),
            _ => None,
        }
    }

    /// Number of pointer and array levels wrapping the base type.
    pub fn indirection_depth(&self) -> usize {
        let mut depth = 0;
        let mut ty = self;
        while let Some(inner) = ty.strip_indirection() {
            depth += 1;
            ty = inner;
        }
        depth
    }

    /// The innermost non-pointer, non-array type.
    pub fn base(&self) -> &CanonicalType {
        let mut ty = self;
        while let Some(inner) = ty.strip_indirection() {
            ty = inner;
        }
        ty
    }

    /// Array size expressions, outermost dimension first.
    pub fn array_sizes(&self) -> Vec<&str> {
        let mut sizes = Vec::new();
        let mut ty = self;
        while let CanonicalType::FixedArray(a) = ty {
            sizes.push(a.size.as_str());
            ty = &a.element;
        }
        sizes
    }

    /// A copy with every function-pointer parameter name erased.
    pub fn erase_param_names(&self) -> CanonicalType {
        match self {
            CanonicalType::Pointer(inner) => CanonicalType::pointer_to(inner.erase_param_names()),
            CanonicalType::FixedArray(a) => {
                CanonicalType::array_of(a.element.erase_param_names(), a.size.clone())
            }
            CanonicalType::FunctionPointer(f) => CanonicalType::function_pointer(
                f.return_type.erase_param_names(),
                f.params
                    .iter()
                    .map(|p| FunctionParam::new("", p.ty.erase_param_names()))
                    .collect(),
            ),
            CanonicalType::Container(c) => CanonicalType::Container(ContainerType {
                name: c.name.clone(),
                element: Box::new(c.element.erase_param_names()),
            }),
            other => other.clone(),
        }
    }
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, ty: CanonicalType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Canonical spelling: pointer and array markers lead, function pointers
/// read `(name: T, ...) -> R`.
impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalType::Primitive(p) => write!(f, "{}", p),
            CanonicalType::Pointer(inner) => write!(f, "*{}", inner),
            CanonicalType::FixedArray(a) => write!(f, "[{}]{}", a.size, a.element),
            CanonicalType::FunctionPointer(fp) => {
                f.write_str("(")?;
                for (i, param) in fp.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", param.name, param.ty)?;
                }
                f.write_str(")")?;
                if !fp.return_type.is_void() {
                    write!(f, " -> {}", fp.return_type)?;
                }
                Ok(())
            }
            CanonicalType::Named(n) => f.write_str(n),
            CanonicalType::Container(c) => write!(f, "{}({})", c.name, c.element),
            CanonicalType::Variadic => f.write_str(".."),
        }
    }
}
