//! # symbind-demangle
//!
//! Exported-symbol handling for symbind.
//!
//! Supports:
//! - `dumpbin /exports` listings
//! - MSVC demangled display names of the common exported-API shape
//!   (`[visibility: ] return __cdecl [Owner::]name(args) [const]`)
//!
//! Note: this is not a demangler. It parses the display strings a dump
//! utility has already produced, and only for functions.

pub mod export;
pub mod index;
pub mod symbol;

pub use export::{parse_export_dump, parse_export_line, SymbolRecord};
pub use index::{IndexDiagnostics, MissedSymbol, SymbolIndex};
pub use symbol::{has_calling_convention, parse_symbol, SymbolDescriptor, Visibility};

use symbind_types::ParseError;
use thiserror::Error;

/// Errors from reading export tables and display names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemangleError {
    #[error("Export listing has no 'ordinal' header")]
    MissingHeader,

    #[error("Not an exported function: {0}")]
    NotExported(String),

    #[error("Malformed symbol '{display}': {reason}")]
    Malformed { display: String, reason: String },

    #[error("Bad type in symbol: {0}")]
    Type(#[from] ParseError),
}

impl DemangleError {
    pub fn is_fatal(&self) -> bool {
        match self {
            DemangleError::Type(err) => err.is_fatal(),
            _ => false,
        }
    }
}
