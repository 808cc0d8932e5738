//! Canonicalizing type spellings.

use super::load_metadata;
use crate::settings::Settings;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use symbind_types::{Canonicalizer, TypeEquivalence};

#[derive(Args)]
pub struct CanonArgs {
    /// Type spellings, e.g. "const char*" or "bool(*)(void*,int)"
    #[arg(required = true)]
    pub spellings: Vec<String>,

    /// Compare each spelling against this one
    #[arg(long, value_name = "SPELLING")]
    pub against: Option<String>,

    /// Enum and struct metadata, for enum names
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,
}

pub fn handle_canon_command(args: &CanonArgs, settings: Settings) -> Result<()> {
    let settings = match load_metadata(args.metadata.as_deref())? {
        Some(metadata) => settings.with_metadata(&metadata),
        None => settings,
    };
    let canon = Canonicalizer::new(&settings.types);

    let against = match &args.against {
        Some(spelling) => Some(
            canon
                .canonicalize(spelling)
                .with_context(|| format!("Cannot canonicalize '{}'", spelling))?,
        ),
        None => None,
    };
    let equiv = TypeEquivalence::new(&settings.types).context("Invalid alias table")?;

    for spelling in &args.spellings {
        let ty = canon
            .canonicalize(spelling)
            .with_context(|| format!("Cannot canonicalize '{}'", spelling))?;

        match &against {
            Some(other) => match equiv.check(&ty, other) {
                Ok(()) => println!("{} => {}  ~  {}", spelling, ty, other),
                Err(mismatch) => println!("{} => {}  !~  {} ({})", spelling, ty, other, mismatch),
            },
            None => println!("{} => {}", spelling, ty),
        }
    }
    Ok(())
}
