//! Extract per-file source facts from one translation unit.
//!
//! Functions, variables, typedefs, records, enums, and both macro views
//! (enabled and disabled candidates, reconciled) land in one JSON document
//! keyed by canonical file path.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};
use tracing::warn;

use cfacts::accumulator;
use cfacts::facts::{self, FactsContext};
use cfacts::frontend::{Frontend, SourceCache};
use cfacts::macros::{self, ScanRegistry};
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Extract functions, variables, types, enums, and macros from one
/// translation unit
#[derive(Parser, Debug)]
#[command(name = "cfacts-src")]
#[command(about = "Extract source facts from a C/C++ translation unit")]
struct Args {
    /// C/C++ source file to analyze
    src: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Compiler flags, forwarded verbatim (everything after `--`)
    #[arg(last = true)]
    compile_args: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn run() -> cfacts::Result<()> {
    let args = Args::parse();
    if !args.src.is_file() {
        return Err(ExtractError::FileNotFound {
            path: args.src.display().to_string(),
        });
    }

    let includes = SystemIncludes::global();
    let compile_args = includes.assemble_args(&args.compile_args);
    let registry = ScanRegistry::global();
    let frontend = Frontend::new()?;

    let mut json = Value::Object(Map::new());
    let mut cache = SourceCache::new();

    let declarations = frontend.parse(&args.src, &compile_args, false, |root| {
        let mut ctx = FactsContext {
            json: &mut json,
            cache: &mut cache,
            includes,
            registry,
        };
        facts::extract_facts(root, &mut ctx);
    });
    if let Err(e) = declarations {
        warn!("declaration pass failed for {}: {e}", args.src.display());
    }

    let macro_pass = frontend.parse(&args.src, &compile_args, true, |root| {
        macros::record_enabled_macros(root, &mut json, &mut cache, includes, registry);
    });
    if let Err(e) = macro_pass {
        warn!("macro pass failed for {}: {e}", args.src.display());
    }

    macros::reconcile(&mut json);

    accumulator::write_json(&args.output, &json)?;
    println!("Wrote source facts to {}", args.output.display());
    println!(
        "Total files found: {}",
        json.as_object().map_or(0, |m| m.len())
    );
    Ok(())
}
