//! Compile-command database ingestion
//!
//! The batch tool consumes a plain-text database with one compile invocation
//! per line: the first whitespace-separated field is the working directory,
//! the remainder is the compiler argv. Build-system probe invocations
//! (CMake `TryCompile`, autoconf `conftest`, `CMakeC*` feature checks) are
//! filtered out, as is anything matching a caller-supplied exclude fragment
//! (the batch tool sources those from the `EXCLUDES` environment variable).

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{ExtractError, Result};

/// Extensions that identify the source-file token of an invocation.
const SRC_EXTENSIONS: [&str; 4] = [".c", ".cc", ".cpp", ".cxx"];

/// One usable entry from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// Directory the compiler was invoked from.
    pub working_dir: String,
    /// Compiler argv with the source-file token removed.
    pub args: Vec<String>,
    /// Source path, made absolute against `working_dir` when relative.
    pub src_file: String,
}

/// Parse one database line. Returns `None` for blank lines and every
/// filtered entry; the caller just moves on.
pub fn parse_line(line: &str, excludes: &[String]) -> Option<CompileCommand> {
    if line.is_empty() {
        return None;
    }
    // Substring containment over the whole line, not a token match.
    if !line.contains("-c") {
        return None;
    }

    let (working_dir, command) = line.split_once(' ')?;
    if working_dir.contains("TryCompile") {
        return None;
    }

    let mut tokens: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return None;
    }

    let src_index = tokens
        .iter()
        .position(|tok| SRC_EXTENSIONS.iter().any(|ext| tok.ends_with(ext)))?;
    let src_token = tokens.remove(src_index);

    if src_token.contains("conftest") || src_token.contains("CMakeC") {
        return None;
    }
    if excludes.iter().any(|frag| src_token.contains(frag.as_str())) {
        return None;
    }

    let src_file = if src_token.starts_with('/') {
        src_token
    } else {
        format!("{working_dir}/{src_token}")
    };

    Some(CompileCommand {
        working_dir: working_dir.to_string(),
        args: tokens,
        src_file,
    })
}

/// Read every usable entry from a database file.
pub fn read_compile_db(path: &Path, excludes: &[String]) -> Result<Vec<CompileCommand>> {
    let text = fs::read_to_string(path).map_err(|_| ExtractError::FileNotFound {
        path: path.display().to_string(),
    })?;

    let commands: Vec<CompileCommand> = text
        .lines()
        .filter_map(|line| parse_line(line, excludes))
        .collect();

    info!(
        "read {} compile commands from {}",
        commands.len(),
        path.display()
    );
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_line() {
        let cmd = parse_line("/build gcc -O2 -c src/main.c -o main.o", &[]).unwrap();
        assert_eq!(cmd.working_dir, "/build");
        assert_eq!(cmd.src_file, "/build/src/main.c");
        assert_eq!(cmd.args, vec!["gcc", "-O2", "-c", "-o", "main.o"]);
    }

    #[test]
    fn test_absolute_source_path_untouched() {
        let cmd = parse_line("/build cc -c /src/lib.cpp", &[]).unwrap();
        assert_eq!(cmd.src_file, "/src/lib.cpp");
    }

    #[test]
    fn test_skips_lines_without_compile_flag() {
        assert_eq!(parse_line("/build ar rcs libfoo.a foo.o", &[]), None);
    }

    #[test]
    fn test_skips_try_compile_dirs() {
        assert_eq!(
            parse_line("/build/CMakeFiles/TryCompile-x gcc -c probe.c", &[]),
            None
        );
    }

    #[test]
    fn test_skips_configure_probes() {
        assert_eq!(parse_line("/build gcc -c conftest.c", &[]), None);
        assert_eq!(
            parse_line("/build gcc -c CMakeCCompilerId.c", &[]),
            None
        );
    }

    #[test]
    fn test_skips_excluded_fragments() {
        let excludes = vec!["third_party".to_string()];
        assert_eq!(
            parse_line("/build gcc -c third_party/zlib/inflate.c", &excludes),
            None
        );
        assert!(parse_line("/build gcc -c src/inflate.c", &excludes).is_some());
    }

    #[test]
    fn test_skips_lines_without_source_token() {
        assert_eq!(parse_line("/build gcc -c -o out.o", &[]), None);
    }

    #[test]
    fn test_read_compile_db_filters_and_collects() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("commands.txt");
        fs::write(
            &db,
            "/build gcc -c a.c\n\n/build/TryCompile-1 gcc -c probe.c\n/build g++ -std=c++17 -c b.cpp\n",
        )
        .unwrap();

        let commands = read_compile_db(&db, &[]).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].src_file, "/build/a.c");
        assert_eq!(commands[1].src_file, "/build/b.cpp");
    }

    #[test]
    fn test_read_compile_db_missing_file_errors() {
        let missing = Path::new("/no/such/commands.txt");
        assert!(read_compile_db(missing, &[]).is_err());
    }
}
