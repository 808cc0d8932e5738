//! Run diagnostics.
//!
//! Every manifest entry that does not end up bound is accounted for here,
//! grouped by why. Lists keep manifest order.

use crate::resolver::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;
use symbind_demangle::IndexDiagnostics;

/// A manifest entry skipped because it did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedEntry {
    pub name: String,
    pub reason: String,
}

/// An entry whose overload set had no structurally matching candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedEntry {
    pub name: String,
    /// One rejection per candidate, in symbol-table order.
    pub rejections: Vec<Rejection>,
}

/// An entry that more than one candidate satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityWarning {
    pub name: String,
    /// Mangled names of every passing candidate, in symbol-table order.
    pub candidates: Vec<String>,
    /// Whether the entry was left unbound instead of taking the first.
    pub rejected: bool,
}

/// Counts and grouped failures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Manifest overloads considered, excluding skipped internal groups.
    pub entries: usize,
    pub resolved: usize,
    pub skipped_constructors: usize,
    pub skipped_destructors: usize,
    pub skipped_internal: usize,
    pub skipped_internal_groups: usize,
    pub malformed: Vec<MalformedEntry>,
    pub no_binary_code: Vec<String>,
    pub no_structural_match: Vec<UnmatchedEntry>,
    pub ambiguous: Vec<AmbiguityWarning>,
    /// Symbol-table side.
    pub symbols: IndexDiagnostics,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries that reached the resolver but were not bound.
    pub fn unresolved(&self) -> usize {
        self.no_binary_code.len()
            + self.no_structural_match.len()
            + self.ambiguous.iter().filter(|a| a.rejected).count()
    }

    pub fn skipped(&self) -> usize {
        self.skipped_constructors + self.skipped_destructors + self.skipped_internal
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} entries: {} resolved, {} unresolved, {} malformed, {} skipped",
            self.entries,
            self.resolved,
            self.unresolved(),
            self.malformed.len(),
            self.skipped()
        )?;
        writeln!(
            f,
            "  skipped: {} constructors, {} destructors, {} internal ({} internal groups)",
            self.skipped_constructors,
            self.skipped_destructors,
            self.skipped_internal,
            self.skipped_internal_groups
        )?;
        writeln!(
            f,
            "  symbols: {} records, {} not exported, {} unparsed",
            self.symbols.total,
            self.symbols.skipped,
            self.symbols.missed.len()
        )?;

        if !self.no_binary_code.is_empty() {
            writeln!(f, "\nNo binary code ({}):", self.no_binary_code.len())?;
            for name in &self.no_binary_code {
                writeln!(f, "  {}", name)?;
            }
        }

        if !self.no_structural_match.is_empty() {
            writeln!(f, "\nNo structural match ({}):", self.no_structural_match.len())?;
            for entry in &self.no_structural_match {
                writeln!(f, "  {}", entry.name)?;
                for rejection in &entry.rejections {
                    writeln!(f, "    {}: {}", rejection.display, rejection.reason)?;
                }
            }
        }

        if !self.ambiguous.is_empty() {
            writeln!(f, "\nAmbiguous ({}):", self.ambiguous.len())?;
            for warning in &self.ambiguous {
                let action = if warning.rejected { "rejected" } else { "took first" };
                writeln!(f, "  {} ({}): {}", warning.name, action, warning.candidates.join(", "))?;
            }
        }

        if !self.malformed.is_empty() {
            writeln!(f, "\nMalformed ({}):", self.malformed.len())?;
            for entry in &self.malformed {
                writeln!(f, "  {}: {}", entry.name, entry.reason)?;
            }
        }

        if !self.symbols.missed.is_empty() {
            writeln!(f, "\nUnparsed symbols ({}):", self.symbols.missed.len())?;
            for missed in &self.symbols.missed {
                writeln!(f, "  #{} {}: {}", missed.ordinal, missed.display, missed.reason)?;
            }
        }

        Ok(())
    }
}
