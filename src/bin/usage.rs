//! Extract assignment and address-of operand types per function.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};

use cfacts::accumulator;
use cfacts::frontend::{Frontend, SourceCache};
use cfacts::toolchain::SystemIncludes;
use cfacts::usage::extract_usage;
use cfacts::ExtractError;

/// Extract operand-type usage from a C/C++ translation unit
#[derive(Parser, Debug)]
#[command(name = "cfacts-usage")]
#[command(about = "Extract assignment and address-of operand types per function")]
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
    let mut cache = SourceCache::new();
    frontend.parse(&args.src, &compile_args, false, |root| {
        extract_usage(root, includes, &mut json, &mut cache);
    })?;

    accumulator::write_json(&args.output, &json)?;
    println!("Type usage extracted to {}", args.output.display());
    Ok(())
}
