//! Command handlers for the symbind CLI.
//!
//! Each submodule owns one subcommand: its clap arguments and its
//! handler.

pub mod canon;
pub mod fields;
pub mod resolve;
pub mod symbols;

pub use canon::{handle_canon_command, CanonArgs};
pub use fields::{handle_fields_command, FieldsArgs};
pub use resolve::{handle_resolve_command, ResolveArgs};
pub use symbols::{handle_symbols_command, SymbolsArgs};

use anyhow::{Context, Result};
use std::path::Path;
use symbind_demangle::{parse_export_dump, SymbolRecord};
use symbind_signatures::Metadata;

/// Read and parse an export listing.
pub fn load_exports(path: &Path) -> Result<Vec<SymbolRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read export listing: {}", path.display()))?;
    parse_export_dump(&text)
        .with_context(|| format!("Failed to parse export listing: {}", path.display()))
}

/// Read the metadata file when one was given.
pub fn load_metadata(path: Option<&Path>) -> Result<Option<Metadata>> {
    path.map(|path| {
        Metadata::load_json(path)
            .with_context(|| format!("Failed to load metadata: {}", path.display()))
    })
    .transpose()
}
