//! Print the exact source of one named function to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use cfacts::frontend::{Frontend, SourceCache};
use cfacts::paths::canonical_abs_path;
use cfacts::ranges::function_source;
use cfacts::toolchain::SystemIncludes;
use cfacts::ExtractError;

/// Print one function's exact source text
#[derive(Parser, Debug)]
#[command(name = "cfacts-funcsrc")]
#[command(about = "Print the source of a named function from a C/C++ translation unit")]
struct Args {
    /// C/C++ source file to analyze
    src: PathBuf,

    /// Name of the function to print
    function: String,

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

    let mut cache = SourceCache::new();
    let source = frontend.parse(&args.src, &compile_args, false, |root| {
        function_source(root, &args.function, &main_file, &mut cache)
    })?;

    match source {
        Some(code) => println!("{code}"),
        None => warn!("function {} not found in {}", args.function, main_file),
    }
    Ok(())
}
