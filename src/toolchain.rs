//! Host-compiler system include directories
//!
//! The front end is handed source text plus explicit flags, so its default
//! header search list may differ from the host compiler's. To make results
//! reproducible, the host compiler is probed once per process for its system
//! include search path, the directories are appended as `-isystem` pairs to
//! every compile-arg list, and the same set backs the system/user file
//! classification that every extractor uses to drop standard-library noise.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use tracing::warn;
use wait_timeout::ChildExt;

/// Bound on the probe subprocess; past this the probe is killed and
/// extraction proceeds with an empty directory list.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Banner delimiters in the compiler's verbose preprocessor output.
const SEARCH_START_ANGLED: &str = "#include <...> search starts here";
const SEARCH_START_QUOTED: &str = "#include \"...\" search starts here";
const SEARCH_END: &str = "End of search list.";

static SYSTEM_INCLUDES: OnceLock<SystemIncludes> = OnceLock::new();

/// The host compiler's system include search directories.
///
/// Computed at most once per process via [`SystemIncludes::global`]. Tests
/// construct instances directly from a captured banner with
/// [`SystemIncludes::from_probe_output`] instead of touching the global.
#[derive(Debug, Clone, Default)]
pub struct SystemIncludes {
    dirs: Vec<String>,
}

impl SystemIncludes {
    /// Process-wide memoized instance, probing the host compiler on first
    /// access.
    pub fn global() -> &'static SystemIncludes {
        SYSTEM_INCLUDES.get_or_init(Self::probe)
    }

    /// Probe the host compiler for its search list. Any failure (no
    /// compiler, spawn error, timeout) degrades to an empty list: extraction
    /// still runs, `-isystem` augmentation is skipped, and the system-file
    /// filter treats nothing as system code.
    pub fn probe() -> Self {
        let compiler = which::which("clang").unwrap_or_else(|_| "clang".into());
        match run_probe(&compiler) {
            Ok(output) => Self::from_probe_output(&output),
            Err(e) => {
                warn!("could not probe {} for system includes: {e}", compiler.display());
                Self::default()
            }
        }
    }

    /// Parse the `search starts here` / `End of search list.` banner. Both
    /// the `<...>` and `"..."` markers open the directory block; each
    /// directory line loses one leading space and its trailing newline.
    pub fn from_probe_output(output: &str) -> Self {
        let mut dirs = Vec::new();
        let mut in_block = false;
        for line in output.lines() {
            if in_block {
                if line.contains(SEARCH_END) {
                    in_block = false;
                    continue;
                }
                if line.contains("starts here") {
                    continue;
                }
                if line.is_empty() {
                    continue;
                }
                let dir = line.strip_prefix(' ').unwrap_or(line);
                dirs.push(dir.to_string());
                continue;
            }
            if line.contains(SEARCH_START_ANGLED) || line.contains(SEARCH_START_QUOTED) {
                in_block = true;
            }
        }
        Self { dirs }
    }

    /// Directories in the order the compiler reported them.
    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    /// True iff any cached system directory is a literal string prefix of
    /// `path`. This is a textual test, not a path-segment test:
    /// `/usr/include` also matches `/usr/include2/foo.h`.
    pub fn is_system_file(&self, path: &str) -> bool {
        self.dirs.iter().any(|dir| path.starts_with(dir.as_str()))
    }

    /// Append `-isystem <dir>` for every cached directory to a caller
    /// supplied argument list.
    pub fn assemble_args(&self, raw: &[String]) -> Vec<String> {
        let mut args = raw.to_vec();
        for dir in &self.dirs {
            args.push("-isystem".to_string());
            args.push(dir.clone());
        }
        args
    }
}

/// Run `<compiler> -E -x c++ - -v` with empty stdin and return the combined
/// stdout/stderr text. The banner lands on stderr; stdout is drained too so
/// the parse sees everything the reference pipeline saw through `2>&1`.
fn run_probe(compiler: &std::path::Path) -> std::io::Result<String> {
    let mut child = Command::new(compiler)
        .args(["-E", "-x", "c++", "-", "-v"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if child.wait_timeout(PROBE_TIMEOUT)?.is_none() {
        child.kill().ok();
        child.wait().ok();
        return Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "system include probe timed out",
        ));
    }

    let mut text = String::new();
    if let Some(mut err) = child.stderr.take() {
        err.read_to_string(&mut text)?;
    }
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut text)?;
    }
    Ok(text)
}
