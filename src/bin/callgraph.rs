//! Build the caller/callee graph of one translation unit.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};

use cfacts::accumulator;
use cfacts::callgraph::build_callgraph;
use cfacts::frontend::Frontend;
use cfacts::paths::canonical_abs_path;
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Extract the function call graph of a C/C++ translation unit
#[derive(Parser, Debug)]
#[command(name = "cfacts-callgraph")]
#[command(about = "Extract caller/callee edges from a C/C++ translation unit")]
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
    let Some(main_file) = canonical_abs_path(&args.src.to_string_lossy()) else {
        return Err(ExtractError::FileNotFound {
            path: args.src.display().to_string(),
        });
    };

    let includes = SystemIncludes::global();
    let compile_args = includes.assemble_args(&args.compile_args);
    let frontend = Frontend::new()?;

    let mut json = Value::Object(Map::new());
    frontend.parse(&args.src, &compile_args, false, |root| {
        build_callgraph(root, &main_file, &mut json);
    })?;

    accumulator::write_json(&args.output, &json)?;
    println!("Function call graph extracted to {}", args.output.display());
    println!(
        "Total functions found: {}",
        json.as_object().map_or(0, |m| m.len())
    );
    Ok(())
}
