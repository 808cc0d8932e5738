//! Listing parsed exported symbols.

use super::load_exports;
use crate::settings::Settings;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use symbind_demangle::{SymbolDescriptor, SymbolIndex};
use symbind_types::Canonicalizer;

#[derive(Args)]
pub struct SymbolsArgs {
    /// Export listing (dumpbin /exports output)
    pub exports: PathBuf,

    /// Only show the overload set for this bare name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Also list records that failed to parse
    #[arg(long)]
    pub missed: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn handle_symbols_command(args: &SymbolsArgs, settings: Settings) -> Result<()> {
    let records = load_exports(&args.exports)?;
    let index = SymbolIndex::build(&records, &Canonicalizer::new(&settings.types));

    let symbols: Vec<&SymbolDescriptor> = match &args.name {
        Some(name) => index.get(name).iter().collect(),
        None => index.iter().flat_map(|(_, group)| group.iter()).collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
        return Ok(());
    }

    println!("{:>7}  Signature", "Ordinal");
    println!("{}", "-".repeat(70));
    for symbol in &symbols {
        println!("{:>7}  {}", symbol.ordinal, signature(symbol));
    }

    let diagnostics = index.diagnostics();
    println!();
    println!(
        "{} records: {} functions in {} overload sets, {} not exported, {} unparsed",
        diagnostics.total,
        index.symbol_count(),
        index.len(),
        diagnostics.skipped,
        diagnostics.missed.len()
    );

    if args.missed {
        for missed in &diagnostics.missed {
            println!("  #{} {}: {}", missed.ordinal, missed.display, missed.reason);
        }
    }
    Ok(())
}

fn signature(symbol: &SymbolDescriptor) -> String {
    let params: Vec<String> = symbol.params.iter().map(ToString::to_string).collect();
    let mut text = format!("{}({})", symbol.qualified_name(), params.join(", "));
    if !symbol.return_type.is_void() {
        text.push_str(&format!(" -> {}", symbol.return_type));
    }
    if symbol.is_const {
        text.push_str(" const");
    }
    if symbol.is_static {
        text.push_str(" static");
    }
    text
}
