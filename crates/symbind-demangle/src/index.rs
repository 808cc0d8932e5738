//! Overload-set index.

use crate::export::SymbolRecord;
use crate::symbol::{parse_symbol, SymbolDescriptor};
use crate::DemangleError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use symbind_types::Canonicalizer;
use tracing::{debug, info};

/// A record that had a calling convention but did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedSymbol {
    pub ordinal: u32,
    pub display: String,
    pub reason: String,
}

/// Counts kept while building the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDiagnostics {
    /// Records offered to the index.
    pub total: usize,
    /// Records without a calling-convention marker.
    pub skipped: usize,
    /// Records that failed the grammar, in table order.
    pub missed: Vec<MissedSymbol>,
}

/// Parsed symbols grouped by bare function name.
///
/// Both the groups and the symbols inside a group keep symbol-table order.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    groups: IndexMap<String, Vec<SymbolDescriptor>>,
    diagnostics: IndexDiagnostics,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and group every record.
    pub fn build(records: &[SymbolRecord], canon: &Canonicalizer<'_>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert_record(record, canon);
        }
        info!(
            total = index.diagnostics.total,
            matched = index.symbol_count(),
            skipped = index.diagnostics.skipped,
            missed = index.diagnostics.missed.len(),
            "built symbol index"
        );
        index
    }

    /// Parse one record and file it under its bare name.
    pub fn insert_record(&mut self, record: &SymbolRecord, canon: &Canonicalizer<'_>) {
        self.diagnostics.total += 1;
        match parse_symbol(record, canon) {
            Ok(symbol) => self.insert(symbol),
            Err(DemangleError::NotExported(shown)) => {
                debug!(display = %shown, "skipping symbol without calling convention");
                self.diagnostics.skipped += 1;
            }
            Err(err) => {
                debug!(display = %record.demangled, error = %err, "no match");
                self.diagnostics.missed.push(MissedSymbol {
                    ordinal: record.ordinal,
                    display: record.demangled.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    pub fn insert(&mut self, symbol: SymbolDescriptor) {
        self.groups
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol);
    }

    /// The overload set for `name`; empty when the name has no symbols.
    pub fn get(&self, name: &str) -> &[SymbolDescriptor] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Number of distinct bare names.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of parsed symbols across all overload sets.
    pub fn symbol_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SymbolDescriptor])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn diagnostics(&self) -> &IndexDiagnostics {
        &self.diagnostics
    }
}
