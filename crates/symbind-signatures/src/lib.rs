//! # symbind-signatures
//!
//! Binds manifest function declarations to the exported symbols that
//! implement them.
//!
//! The crate reads the cimgui-style declaration manifest and metadata,
//! builds a [`FunctionDescriptor`] per overload, resolves each against a
//! [`SymbolIndex`](symbind_demangle::SymbolIndex) using the type
//! equivalence relation, and plans a forwarding shim where the raw
//! declaration cannot express the call.
//!
//! # Example
//!
//! ```ignore
//! use symbind_signatures::{bind, Manifest, ResolverConfig};
//! use symbind_demangle::{parse_export_dump, SymbolIndex};
//! use symbind_types::{Canonicalizer, TypeConfig};
//!
//! let types = TypeConfig::imgui();
//! let records = parse_export_dump(&dump)?;
//! let index = SymbolIndex::build(&records, &Canonicalizer::new(&types));
//! let manifest = Manifest::load_json("definitions.json")?;
//!
//! let report = bind(&manifest, &index, &types, &ResolverConfig::default())?;
//! for binding in &report.bindings {
//!     println!("{} -> {}", binding.descriptor.overload_name, binding.mangled());
//! }
//! print!("{}", report.diagnostics);
//! ```

/// Logs at `info` for entries under diagnosis, `trace` otherwise.
macro_rules! escalate {
    ($diagnose:expr, $($arg:tt)+) => {
        if $diagnose {
            tracing::info!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    };
}

pub mod adapter;
pub mod defaults;
pub mod descriptor;
pub mod diagnostics;
pub mod fields;
pub mod manifest;
pub mod pipeline;
pub mod resolver;

pub use adapter::{AdapterPlan, ArgumentPlan, ExternalType, Forward, ShimReason};
pub use defaults::{DefaultKind, DefaultValue};
pub use descriptor::{collect_descriptors, FunctionDescriptor};
pub use diagnostics::{AmbiguityWarning, Diagnostics, MalformedEntry, UnmatchedEntry};
pub use fields::{canonicalize_field, canonicalize_struct, FieldRecord};
pub use manifest::{DefinitionEntry, EnumConstants, Manifest, Metadata, StructField, TypedArg};
pub use pipeline::{bind, ResolutionReport};
pub use resolver::{
    AmbiguityPolicy, Binding, RejectReason, Rejection, Resolution, Resolver, ResolverConfig,
};

use symbind_demangle::DemangleError;
use symbind_types::ParseError;

/// Error type for binding runs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Symbol error: {0}")]
    Demangle(#[from] DemangleError),

    #[error("Symbol {mangled} bound by both {first} and {second}")]
    SymbolCollision {
        mangled: String,
        first: String,
        second: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
