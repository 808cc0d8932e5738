//! Canonicalizing struct fields.

use crate::settings::Settings;
use anyhow::{bail, Context, Result};
use clap::Args;
use indexmap::IndexMap;
use std::path::PathBuf;
use symbind_signatures::{canonicalize_struct, FieldRecord, Metadata};
use symbind_types::Canonicalizer;
use tracing::debug;

#[derive(Args)]
pub struct FieldsArgs {
    /// Enum and struct metadata (structs_and_enums.json)
    pub metadata: PathBuf,

    /// Structs to show; all when omitted
    pub structs: Vec<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn handle_fields_command(args: &FieldsArgs, settings: Settings) -> Result<()> {
    let metadata = Metadata::load_json(&args.metadata)
        .with_context(|| format!("Failed to load metadata: {}", args.metadata.display()))?;
    let settings = settings.with_metadata(&metadata);
    let canon = Canonicalizer::new(&settings.types);
    let constants = metadata.enum_constants();
    debug!(constants = constants.len(), "resolved enum constants");

    let names: Vec<&str> = if args.structs.is_empty() {
        metadata.structs.keys().map(String::as_str).collect()
    } else {
        args.structs.iter().map(String::as_str).collect()
    };

    let mut out: IndexMap<&str, Vec<FieldRecord>> = IndexMap::new();
    for name in names {
        let Some(fields) = metadata.structs.get(name) else {
            bail!("Unknown struct: {}", name);
        };
        let records = canonicalize_struct(fields, &canon, &constants)
            .with_context(|| format!("Failed to canonicalize struct {}", name))?;
        out.insert(name, records);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (name, records) in &out {
        match metadata.location(name) {
            Some(location) => println!("{} ({})", name, location),
            None => println!("{}", name),
        }
        for record in records {
            match record.bitfield {
                Some(bits) => println!("    {}: {} : {}", record.name, record.ty, bits),
                None => println!("    {}: {}", record.name, record.ty),
            }
        }
    }
    Ok(())
}
