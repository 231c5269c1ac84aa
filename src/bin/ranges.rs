//! Map function definitions to their source line spans.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};

use cfacts::accumulator;
use cfacts::frontend::Frontend;
use cfacts::ranges::extract_ranges;
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Extract begin/end line numbers for every function definition
#[derive(Parser, Debug)]
#[command(name = "cfacts-ranges")]
#[command(about = "Extract function line spans from a C/C++ translation unit")]
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
    let frontend = Frontend::new()?;

    let mut json = Value::Object(Map::new());
    frontend.parse(&args.src, &compile_args, false, |root| {
        extract_ranges(root, includes, &mut json);
    })?;

    accumulator::write_json(&args.output, &json)?;
    println!("Result written to {}", args.output.display());

    let files = json.as_object().map_or(0, |m| m.len());
    let functions: usize = json
        .as_object()
        .map_or(0, |m| m.values().filter_map(|v| v.as_object()).map(|f| f.len()).sum());
    println!("Total files found: {files}");
    println!("Total functions found: {functions}");
    Ok(())
}
