//! Binding manifest entries to exported symbols.

use super::{load_exports, load_metadata};
use crate::settings::Settings;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use symbind_demangle::SymbolIndex;
use symbind_signatures::{bind, AmbiguityPolicy, Binding, Forward, Manifest, ResolutionReport};
use symbind_types::Canonicalizer;

#[derive(Args)]
pub struct ResolveArgs {
    /// Declaration manifest (definitions.json)
    pub definitions: PathBuf,

    /// Export listing (dumpbin /exports output)
    pub exports: PathBuf,

    /// Enum and struct metadata (structs_and_enums.json)
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// Log every resolution step for these names at info level
    #[arg(long, value_name = "NAME")]
    pub diagnose: Vec<String>,

    /// Also resolve entries declared in internal headers
    #[arg(long)]
    pub include_internal: bool,

    /// Leave entries unbound when more than one symbol matches
    #[arg(long)]
    pub reject_ambiguous: bool,

    /// Only list bindings that need a forwarding shim
    #[arg(long)]
    pub shims: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn handle_resolve_command(args: &ResolveArgs, settings: Settings) -> Result<()> {
    let metadata = load_metadata(args.metadata.as_deref())?;
    let mut settings = match &metadata {
        Some(metadata) => settings.with_metadata(metadata),
        None => settings,
    };
    settings.resolver.diagnose.extend(args.diagnose.iter().cloned());
    if args.include_internal {
        settings.resolver.skip_internal = false;
    }
    if args.reject_ambiguous {
        settings.resolver.ambiguity = AmbiguityPolicy::Reject;
    }

    let manifest = Manifest::load_json(&args.definitions)
        .with_context(|| format!("Failed to load manifest: {}", args.definitions.display()))?;
    let records = load_exports(&args.exports)?;
    let index = SymbolIndex::build(&records, &Canonicalizer::new(&settings.types));

    let report = bind(&manifest, &index, &settings.types, &settings.resolver)
        .context("Resolution aborted")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.shims);
    }
    Ok(())
}

fn print_report(report: &ResolutionReport, shims_only: bool) {
    let bindings: Vec<&Binding> = if shims_only {
        report.shims().collect()
    } else {
        report.bindings.iter().collect()
    };

    println!("{:<40} {:<8} Symbol", "Function", "Shim");
    println!("{}", "-".repeat(90));
    for binding in &bindings {
        let shim = if binding.plan.needs_shim { "yes" } else { "" };
        println!(
            "{:<40} {:<8} {}",
            binding.descriptor.overload_name,
            shim,
            binding.mangled()
        );
        if binding.plan.needs_shim {
            print_plan(binding);
        }
    }
    println!();
    print!("{}", report.diagnostics);
}

fn print_plan(binding: &Binding) {
    for arg in &binding.plan.args {
        let Some(reason) = arg.reason else {
            continue;
        };
        let forward = match arg.forward {
            Forward::Identity => arg.name.clone(),
            Forward::BufferPointer => format!("{}.data", arg.name),
            Forward::AddressOf => format!("&{}", arg.name),
        };
        let default = arg
            .default
            .as_deref()
            .map(|d| format!(" = {}", d))
            .unwrap_or_default();
        println!(
            "    {}: {}{} -> {} as {} ({})",
            arg.name, arg.external, default, forward, arg.internal, reason
        );
    }
}
