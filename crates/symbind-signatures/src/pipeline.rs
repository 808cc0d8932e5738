//! End-to-end binding run.

use crate::descriptor::collect_descriptors;
use crate::diagnostics::Diagnostics;
use crate::manifest::Manifest;
use crate::resolver::{Binding, Resolver, ResolverConfig};
use crate::Result;
use serde::{Deserialize, Serialize};
use symbind_demangle::SymbolIndex;
use symbind_types::{Canonicalizer, TypeConfig, TypeEquivalence};
use tracing::info;

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Bound functions, in manifest order.
    pub bindings: Vec<Binding>,
    pub diagnostics: Diagnostics,
}

impl ResolutionReport {
    /// Bindings whose call needs a forwarding shim.
    pub fn shims(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(|b| b.plan.needs_shim)
    }
}

/// Bind every manifest entry to its symbol.
///
/// Fails only on fatal conditions: unresolvable array arithmetic in a
/// declaration, or two entries binding the same mangled name.
pub fn bind(
    manifest: &Manifest,
    index: &SymbolIndex,
    types: &TypeConfig,
    config: &ResolverConfig,
) -> Result<ResolutionReport> {
    let canon = Canonicalizer::new(types);
    let equiv = TypeEquivalence::new(types)?;

    let mut diagnostics = Diagnostics {
        symbols: index.diagnostics().clone(),
        ..Diagnostics::default()
    };
    let descriptors = collect_descriptors(manifest, &canon, config, &mut diagnostics)?;
    info!(
        descriptors = descriptors.len(),
        symbols = index.symbol_count(),
        "resolving"
    );

    let bindings = Resolver::new(index, &equiv, config).resolve_all(&descriptors, &mut diagnostics)?;
    Ok(ResolutionReport {
        bindings,
        diagnostics,
    })
}
