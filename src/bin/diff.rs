//! Structural diff between two parses of (near-)identical sources.
//!
//! Both files are parsed with the same compile arguments; the output file
//! receives the literal text `True` when a structural difference is found
//! and `False` otherwise.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cfacts::diff::{flatten, has_structural_diff};
use cfacts::frontend::Frontend;
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Compare two C/C++ sources for structural parse-tree differences
#[derive(Parser, Debug)]
#[command(name = "cfacts-diff")]
#[command(about = "Detect structural differences between two parse trees")]
#[command(after_help = "Both source files are parsed with the same compile arguments.")]
struct Args {
    /// First C/C++ source file
    src1: PathBuf,

    /// Second C/C++ source file
    src2: PathBuf,

    /// Output text file receiving `True` or `False`
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
    for src in [&args.src1, &args.src2] {
        if !src.is_file() {
            return Err(ExtractError::FileNotFound {
                path: src.display().to_string(),
            });
        }
    }

    let includes = SystemIncludes::global();
    let compile_args = includes.assemble_args(&args.compile_args);
    let frontend = Frontend::new()?;

    let tree1 = frontend.parse(&args.src1, &compile_args, false, flatten)?;
    let tree2 = frontend.parse(&args.src2, &compile_args, false, flatten)?;

    let has_diff = has_structural_diff(&tree1, &tree2);

    fs::write(&args.output, if has_diff { "True" } else { "False" }).map_err(|_| {
        ExtractError::OutputFile {
            path: args.output.display().to_string(),
        }
    })?;

    println!("Output written to {}", args.output.display());
    println!("Differences found: {}", if has_diff { "Yes" } else { "No" });
    Ok(())
}
