//! # symbind-types
//!
//! C type-string handling for symbind.
//!
//! This crate provides:
//! - Canonical type representation (primitives, pointers, arrays, function pointers)
//! - A tokenizer and recursive-descent canonicalizer for C type spellings
//! - Balanced argument-list splitting and function-pointer declarator matching
//! - Manifest argument declaration parsing
//! - The type equivalence relation used to match signatures
//! - A minimal array-size expression evaluator
//!
//! # Example
//!
//! ```
//! use symbind_types::{Canonicalizer, TypeConfig, TypeEquivalence};
//!
//! let config = TypeConfig::imgui();
//! let canon = Canonicalizer::new(&config);
//!
//! let a = canon.canonicalize("const char*").unwrap();
//! let b = canon.canonicalize("char const *").unwrap();
//! assert_eq!(a.to_string(), "*u8");
//!
//! let eq = TypeEquivalence::new(&config).unwrap();
//! assert!(eq.equivalent(&a, &b));
//! ```

pub mod argument;
pub mod config;
pub mod equiv;
pub mod expr;
pub mod fnptr;
pub mod parser;
pub mod split;
pub mod types;

pub use argument::{parse_argument, unnamed, ArgumentRecord};
pub use config::{LegacyAlias, PrimitiveRule, PrimitiveTable, TypeConfig};
pub use equiv::{TypeEquivalence, TypeMismatch};
pub use fnptr::{match_function_pointer, FunctionPointerDecl, CALLING_CONVENTIONS};
pub use parser::{canonicalize, Canonicalizer, ParseError, ParseResult};
pub use split::{matching_open, split_args};
pub use types::*;
