//! symbind - bind manifest declarations to exported binary symbols
//!
//! Usage:
//!   symbind resolve <definitions.json> <exports.txt>   Bind every manifest entry
//!   symbind symbols <exports.txt>                      List parsed exports
//!   symbind canon <spelling>...                        Canonicalize type spellings
//!   symbind fields <structs_and_enums.json> [struct]   Canonicalize struct fields

mod commands;
mod logging;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    handle_canon_command, handle_fields_command, handle_resolve_command, handle_symbols_command,
    CanonArgs, FieldsArgs, ResolveArgs, SymbolsArgs,
};
use settings::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "symbind")]
#[command(about = "Bind manifest declarations to exported binary symbols", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file overriding type and resolver settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve manifest entries against an export listing
    Resolve(ResolveArgs),
    /// List the functions parsed from an export listing
    Symbols(SymbolsArgs),
    /// Print the canonical form of type spellings
    Canon(CanonArgs),
    /// Print canonical struct field types
    Fields(FieldsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let diagnosing = matches!(&cli.command, Commands::Resolve(args) if !args.diagnose.is_empty());
    logging::init(cli.verbose, diagnosing)?;

    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Resolve(args) => handle_resolve_command(args, settings),
        Commands::Symbols(args) => handle_symbols_command(args, settings),
        Commands::Canon(args) => handle_canon_command(args, settings),
        Commands::Fields(args) => handle_fields_command(args, settings),
    }
}
