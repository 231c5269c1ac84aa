//! Batch fact extraction driven by a compile-command database.
//!
//! Reads a line-oriented database (working directory + compiler argv per
//! line), runs the declaration and macro passes over every translation
//! unit with its recorded flags, reconciles the macro views once at the
//! end, and writes one merged JSON document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};
use tracing::warn;

use cfacts::accumulator;
use cfacts::compile_db::{self, CompileCommand};
use cfacts::facts::{self, FactsContext};
use cfacts::frontend::{Frontend, SourceCache};
use cfacts::macros::{self, ScanRegistry};
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Compiler executables to strip from the front of a recorded argv; the
/// front end only wants the flags.
const COMPILER_NAMES: [&str; 6] = ["cc", "c++", "gcc", "g++", "clang", "clang++"];

/// Extract source facts for every entry of a compile-command database
#[derive(Parser, Debug)]
#[command(name = "cfacts-data")]
#[command(about = "Batch-extract source facts from a compile-command database")]
struct Args {
    /// Compile-command database, one entry per line
    compile_db: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Space-separated path fragments; matching source files are skipped
    #[arg(long, env = "EXCLUDES", value_name = "FRAGMENTS")]
    excludes: Option<String>,
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

    let excludes: Vec<String> = args
        .excludes
        .as_deref()
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if !excludes.is_empty() {
        println!("Found {} exclude fragments.", excludes.len());
    }

    let commands = compile_db::read_compile_db(&args.compile_db, &excludes)?;
    if commands.is_empty() {
        return Err(ExtractError::EmptyCompileDb {
            path: args.compile_db.display().to_string(),
        });
    }

    let includes = SystemIncludes::global();
    let registry = ScanRegistry::global();
    let frontend = Frontend::new()?;

    let mut json = Value::Object(Map::new());
    let mut cache = SourceCache::new();

    for command in &commands {
        extract_one(
            &frontend,
            command,
            includes,
            registry,
            &mut json,
            &mut cache,
        );
    }

    // One reconciliation over the whole run: a macro disabled under one
    // invocation's flags may be enabled under another's.
    macros::reconcile(&mut json);

    accumulator::write_json(&args.output, &json)?;
    println!("Wrote code data to {}", args.output.display());
    println!(
        "Total files found: {}",
        json.as_object().map_or(0, |m| m.len())
    );
    Ok(())
}

fn extract_one(
    frontend: &Frontend,
    command: &CompileCommand,
    includes: &SystemIncludes,
    registry: &ScanRegistry,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    let src = PathBuf::from(&command.src_file);
    if !src.is_file() {
        warn!("skipping missing source file {}", src.display());
        return;
    }

    let flags: Vec<String> = command
        .args
        .iter()
        .skip_while(|arg| COMPILER_NAMES.iter().any(|name| arg.ends_with(name)))
        .cloned()
        .collect();
    let compile_args = includes.assemble_args(&flags);

    let declarations = frontend.parse(&src, &compile_args, false, |root| {
        let mut ctx = FactsContext {
            json: &mut *json,
            cache: &mut *cache,
            includes,
            registry,
        };
        facts::extract_facts(root, &mut ctx);
    });
    if let Err(e) = declarations {
        warn!("declaration pass failed for {}: {e}", src.display());
        return;
    }

    let macro_pass = frontend.parse(&src, &compile_args, true, |root| {
        macros::record_enabled_macros(root, &mut *json, &mut *cache, includes, registry);
    });
    if let Err(e) = macro_pass {
        warn!("macro pass failed for {}: {e}", src.display());
    }
}
