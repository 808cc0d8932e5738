//! Signature resolution.
//!
//! Matches each manifest descriptor to the one exported symbol that
//! implements it. Candidates come from the overload set sharing the bare
//! name; each is checked for owner, return type and the pairwise argument
//! sequence. Descriptors resolve independently and in parallel; the
//! uniqueness check on mangled names runs afterwards in manifest order.

use crate::adapter::AdapterPlan;
use crate::descriptor::FunctionDescriptor;
use crate::diagnostics::{AmbiguityWarning, Diagnostics, UnmatchedEntry};
use crate::manifest::DefinitionEntry;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use symbind_demangle::{SymbolDescriptor, SymbolIndex};
use symbind_types::{ArgumentRecord, TypeEquivalence, TypeMismatch};
use tracing::{debug, info, info_span, trace_span, warn};

const RECEIVER: &str = "self";

/// What to do when more than one candidate passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Bind the first passing candidate in symbol-table order and warn.
    #[default]
    FirstMatch,
    /// Leave the entry unbound and report it as ambiguous.
    Reject,
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Leave out entries declared in internal headers.
    pub skip_internal: bool,
    pub ambiguity: AmbiguityPolicy,
    /// Names whose resolution is logged at `info` level. Matches the bare
    /// name, the qualified name or the unique overload name.
    pub diagnose: BTreeSet<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            skip_internal: true,
            ambiguity: AmbiguityPolicy::default(),
            diagnose: BTreeSet::new(),
        }
    }
}

impl ResolverConfig {
    pub fn diagnoses(&self, descriptor: &FunctionDescriptor) -> bool {
        !self.diagnose.is_empty()
            && (self.diagnose.contains(&descriptor.name)
                || self.diagnose.contains(&descriptor.overload_name)
                || self.diagnose.contains(&descriptor.qualified_name()))
    }

    /// Same check against a raw manifest entry, before it has a descriptor.
    pub fn diagnoses_entry(&self, entry: &DefinitionEntry) -> bool {
        !self.diagnose.is_empty()
            && (self.diagnose.contains(&entry.funcname)
                || self.diagnose.contains(&entry.display_name()))
    }
}

/// Why a candidate symbol was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    Owner {
        expected: Option<String>,
        found: Option<String>,
    },
    Return {
        mismatch: TypeMismatch,
    },
    Argument {
        index: usize,
        mismatch: TypeMismatch,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Owner { expected, found } => write!(
                f,
                "owner: expected {}, found {}",
                expected.as_deref().unwrap_or("<none>"),
                found.as_deref().unwrap_or("<none>")
            ),
            RejectReason::Return { mismatch } => write!(f, "return: {}", mismatch),
            RejectReason::Argument { index, mismatch } => {
                write!(f, "argument {}: {}", index, mismatch)
            }
        }
    }
}

/// One rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub mangled: String,
    pub display: String,
    pub reason: RejectReason,
}

/// A descriptor bound to its symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub descriptor: FunctionDescriptor,
    pub symbol: SymbolDescriptor,
    pub plan: AdapterPlan,
    /// Other passing candidates, when the first match was taken.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl Binding {
    pub fn mangled(&self) -> &str {
        &self.symbol.mangled
    }
}

/// The outcome for one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Box<Binding>),
    /// The overload set is empty.
    NoBinaryCode,
    /// Every candidate was rejected.
    NoStructuralMatch { rejections: Vec<Rejection> },
    /// More than one candidate passed under [`AmbiguityPolicy::Reject`].
    Ambiguous { candidates: Vec<String> },
}

/// Resolves descriptors against a symbol index.
pub struct Resolver<'a> {
    index: &'a SymbolIndex,
    equiv: &'a TypeEquivalence<'a>,
    config: &'a ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a SymbolIndex, equiv: &'a TypeEquivalence<'a>, config: &'a ResolverConfig) -> Self {
        Self {
            index,
            equiv,
            config,
        }
    }

    /// Resolve one descriptor.
    pub fn resolve_one(&self, descriptor: &FunctionDescriptor) -> Resolution {
        let diagnose = self.config.diagnoses(descriptor);
        let span = if diagnose {
            info_span!("resolve", name = %descriptor.overload_name)
        } else {
            trace_span!("resolve", name = %descriptor.overload_name)
        };
        let _enter = span.enter();

        let candidates = self.index.get(&descriptor.name);
        if candidates.is_empty() {
            escalate!(diagnose, "no binary code");
            return Resolution::NoBinaryCode;
        }

        let mut passing: Vec<&SymbolDescriptor> = Vec::new();
        let mut rejections = Vec::new();
        for candidate in candidates {
            match self.check_candidate(descriptor, candidate) {
                Ok(()) => {
                    escalate!(diagnose, candidate = %candidate.display, "candidate passed");
                    passing.push(candidate);
                }
                Err(reason) => {
                    escalate!(diagnose, candidate = %candidate.display, %reason, "candidate rejected");
                    rejections.push(Rejection {
                        mangled: candidate.mangled.clone(),
                        display: candidate.display.clone(),
                        reason,
                    });
                }
            }
        }

        let Some((first, rest)) = passing.split_first() else {
            escalate!(diagnose, candidates = candidates.len(), "no structural match");
            return Resolution::NoStructuralMatch { rejections };
        };

        let alternatives: Vec<String> = rest.iter().map(|s| s.mangled.clone()).collect();
        if !alternatives.is_empty() {
            warn!(
                name = %descriptor.overload_name,
                chosen = %first.mangled,
                others = alternatives.len(),
                "more than one candidate matches"
            );
            if self.config.ambiguity == AmbiguityPolicy::Reject {
                return Resolution::Ambiguous {
                    candidates: passing.iter().map(|s| s.mangled.clone()).collect(),
                };
            }
        }

        escalate!(diagnose, mangled = %first.mangled, "resolved");
        Resolution::Resolved(Box::new(Binding {
            descriptor: descriptor.clone(),
            symbol: (*first).clone(),
            plan: AdapterPlan::for_descriptor(descriptor, diagnose),
            alternatives,
        }))
    }

    /// Resolve every descriptor and merge the outcomes in input order.
    ///
    /// Fails with [`Error::SymbolCollision`] when two descriptors bind the
    /// same mangled name.
    pub fn resolve_all(
        &self,
        descriptors: &[FunctionDescriptor],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Binding>> {
        let outcomes: Vec<Resolution> = descriptors.par_iter().map(|d| self.resolve_one(d)).collect();

        let mut claimed: HashMap<String, String> = HashMap::with_capacity(descriptors.len());
        let mut bindings = Vec::new();
        for (descriptor, outcome) in descriptors.iter().zip(outcomes) {
            let name = descriptor.overload_name.clone();
            match outcome {
                Resolution::Resolved(binding) => {
                    if let Some(first) = claimed.get(binding.mangled()) {
                        return Err(Error::SymbolCollision {
                            mangled: binding.mangled().to_string(),
                            first: first.clone(),
                            second: name,
                        });
                    }
                    claimed.insert(binding.mangled().to_string(), name.clone());

                    if !binding.alternatives.is_empty() {
                        let mut candidates = vec![binding.mangled().to_string()];
                        candidates.extend(binding.alternatives.iter().cloned());
                        diagnostics.ambiguous.push(AmbiguityWarning {
                            name,
                            candidates,
                            rejected: false,
                        });
                    }
                    diagnostics.resolved += 1;
                    bindings.push(*binding);
                }
                Resolution::NoBinaryCode => diagnostics.no_binary_code.push(name),
                Resolution::NoStructuralMatch { rejections } => {
                    diagnostics.no_structural_match.push(UnmatchedEntry { name, rejections })
                }
                Resolution::Ambiguous { candidates } => diagnostics.ambiguous.push(AmbiguityWarning {
                    name,
                    candidates,
                    rejected: true,
                }),
            }
        }

        info!(
            resolved = bindings.len(),
            no_binary_code = diagnostics.no_binary_code.len(),
            no_structural_match = diagnostics.no_structural_match.len(),
            ambiguous = diagnostics.ambiguous.len(),
            "resolution finished"
        );
        Ok(bindings)
    }

    fn check_candidate(
        &self,
        descriptor: &FunctionDescriptor,
        candidate: &SymbolDescriptor,
    ) -> std::result::Result<(), RejectReason> {
        let found = candidate.owner.as_deref().filter(|o| !o.is_empty());
        let owner_matches = match found {
            Some(owner) => {
                descriptor.struct_name.as_deref() == Some(owner)
                    || descriptor.namespace.as_deref() == Some(owner)
            }
            None => descriptor.struct_name.is_none() && descriptor.namespace.is_none(),
        };
        if !owner_matches {
            return Err(RejectReason::Owner {
                expected: descriptor
                    .struct_name
                    .clone()
                    .or_else(|| descriptor.namespace.clone()),
                found: found.map(str::to_string),
            });
        }

        self.equiv
            .check(&descriptor.return_type, &candidate.return_type)
            .map_err(|mismatch| RejectReason::Return { mismatch })?;

        let args = compared_args(descriptor, candidate);
        let len = args.len().max(candidate.params.len());
        for index in 0..len {
            self.equiv
                .check_optional(args.get(index).map(|a| &a.ty), candidate.params.get(index))
                .map_err(|mismatch| RejectReason::Argument { index, mismatch })?;
        }
        debug!(candidate = %candidate.qualified_name(), "signature matches");
        Ok(())
    }
}

/// Manifest arguments compared against `candidate`'s parameters. A leading
/// `self` stands for the implicit receiver of a member function.
fn compared_args<'d>(descriptor: &'d FunctionDescriptor, candidate: &SymbolDescriptor) -> &'d [ArgumentRecord] {
    match descriptor.args.split_first() {
        Some((first, rest)) if candidate.has_receiver() && first.name == RECEIVER => rest,
        _ => &descriptor.args,
    }
}
