//! Type equivalence.
//!
//! Decides whether two canonical types denote the same binary
//! representation. Rules are tried in order:
//!
//! 1. structural equality
//! 2. registered alias on either side
//! 3. enum name against `s32`
//! 4. pointer/array levels stripped pairwise (arrays decay to pointers)
//! 5. function pointers compared with parameter names erased
//! 6. legacy special cases (wide-character width, identifier aliases)
//!
//! The relation is reflexive and symmetric but not transitive: `A ~ s32`
//! and `s32 ~ B` do not imply `A ~ B` for two distinct enums.

use crate::config::TypeConfig;
use crate::parser::{Canonicalizer, ParseResult};
use crate::types::{CanonicalType, Primitive};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How many alias expansions a single comparison may chain.
const MAX_ALIAS_DEPTH: usize = 4;

/// Rendering of the padding sentinel in mismatch reports.
const SENTINEL: &str = "<none>";

/// The innermost pair of types that failed to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub left: String,
    pub right: String,
}

impl TypeMismatch {
    fn new(left: &CanonicalType, right: &CanonicalType) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a: {}, b: {}", self.left, self.right)
    }
}

impl std::error::Error for TypeMismatch {}

/// The equivalence relation for one configuration.
#[derive(Debug, Clone)]
pub struct TypeEquivalence<'c> {
    config: &'c TypeConfig,
    aliases: HashMap<String, CanonicalType>,
    legacy: Vec<(String, CanonicalType)>,
}

impl<'c> TypeEquivalence<'c> {
    /// Build the relation, canonicalizing every alias target up front.
    pub fn new(config: &'c TypeConfig) -> ParseResult<Self> {
        let canon = Canonicalizer::new(config);

        let mut aliases = HashMap::with_capacity(config.aliases.len());
        for (name, target) in &config.aliases {
            let key = config.strip_identifier(name).to_string();
            aliases.insert(key, canon.canonicalize(target)?);
        }

        let mut legacy = Vec::with_capacity(config.legacy_aliases.len() + 1);
        for alias in &config.legacy_aliases {
            legacy.push((alias.name.clone(), canon.canonicalize(&alias.target)?));
        }
        if let Some(wide) = &config.wide_char_name {
            let width = if config.wide_char_32 {
                Primitive::U32
            } else {
                Primitive::U16
            };
            legacy.push((wide.clone(), CanonicalType::primitive(width)));
        }

        Ok(Self {
            config,
            aliases,
            legacy,
        })
    }

    pub fn config(&self) -> &'c TypeConfig {
        self.config
    }

    /// Whether `a` and `b` are equivalent.
    pub fn equivalent(&self, a: &CanonicalType, b: &CanonicalType) -> bool {
        self.check(a, b).is_ok()
    }

    /// Compare two types, returning the innermost failing pair.
    pub fn check(&self, a: &CanonicalType, b: &CanonicalType) -> Result<(), TypeMismatch> {
        self.check_within(a, b, MAX_ALIAS_DEPTH)
    }

    /// Compare two possibly-absent types. Absence only matches absence.
    pub fn check_optional(
        &self,
        a: Option<&CanonicalType>,
        b: Option<&CanonicalType>,
    ) -> Result<(), TypeMismatch> {
        match (a, b) {
            (Some(a), Some(b)) => self.check(a, b),
            (None, None) => Ok(()),
            (Some(a), None) => Err(TypeMismatch {
                left: a.to_string(),
                right: SENTINEL.to_string(),
            }),
            (None, Some(b)) => Err(TypeMismatch {
                left: SENTINEL.to_string(),
                right: b.to_string(),
            }),
        }
    }

    fn check_within(
        &self,
        a: &CanonicalType,
        b: &CanonicalType,
        budget: usize,
    ) -> Result<(), TypeMismatch> {
        if a == b {
            return Ok(());
        }

        if budget > 0 && (self.via_alias(a, b, budget) || self.via_alias(b, a, budget)) {
            return Ok(());
        }

        if self.enum_as_int(a, b) || self.enum_as_int(b, a) {
            return Ok(());
        }

        if let (Some(inner_a), Some(inner_b)) = (a.strip_indirection(), b.strip_indirection()) {
            return self.check_within(inner_a, inner_b, budget);
        }

        match (a, b) {
            (CanonicalType::FunctionPointer(fa), CanonicalType::FunctionPointer(fb)) => {
                if fa.params.len() != fb.params.len() {
                    return Err(TypeMismatch::new(&a.erase_param_names(), &b.erase_param_names()));
                }
                self.check_within(&fa.return_type, &fb.return_type, budget)?;
                for (pa, pb) in fa.params.iter().zip(&fb.params) {
                    self.check_within(&pa.ty, &pb.ty, budget)?;
                }
                return Ok(());
            }
            (CanonicalType::Container(ca), CanonicalType::Container(cb)) if ca.name == cb.name => {
                return self.check_within(&ca.element, &cb.element, budget);
            }
            _ => {}
        }

        if self.legacy_match(a, b) || self.legacy_match(b, a) {
            return Ok(());
        }

        Err(TypeMismatch::new(a, b))
    }

    /// `a` names an alias whose target is equivalent to `b`.
    fn via_alias(&self, a: &CanonicalType, b: &CanonicalType, budget: usize) -> bool {
        let CanonicalType::Named(name) = a else {
            return false;
        };
        match self.aliases.get(name) {
            Some(target) => self.check_within(target, b, budget - 1).is_ok(),
            None => false,
        }
    }

    fn enum_as_int(&self, a: &CanonicalType, b: &CanonicalType) -> bool {
        match (a, b) {
            (CanonicalType::Named(name), CanonicalType::Primitive(Primitive::S32)) => {
                self.config.is_enum(name)
            }
            _ => false,
        }
    }

    fn legacy_match(&self, a: &CanonicalType, b: &CanonicalType) -> bool {
        let CanonicalType::Named(name) = a else {
            return false;
        };
        self.legacy
            .iter()
            .any(|(legacy_name, target)| legacy_name == name && target == b)
    }
}
