//! cfacts: C/C++ source-fact extraction
//!
//! A family of small tools that pull structured facts out of C/C++
//! translation units — function, variable, type, and macro definitions with
//! exact source text and line spans, caller/callee graphs, function ranges,
//! operand-usage records, and structural parse-tree diffs — emitted as JSON
//! for downstream tooling.
//!
//! Parsing is delegated entirely to libclang (via the `clang` crate); this
//! crate is a structured consumer of the resulting declaration tree. The
//! shared infrastructure lives here in the library:
//!
//! - [`toolchain`]: probing the host compiler for its system include search
//!   path, classifying files as system vs. user code, assembling compile
//!   arguments.
//! - [`accumulator`]: the nested-map output builder every extractor merges
//!   facts into.
//! - [`facts`], [`macros`], [`callgraph`], [`diff`], [`ranges`], [`usage`]:
//!   the individual extractors.
//! - [`compile_db`]: line-oriented compile-command database ingestion for
//!   batch runs.
//!
//! # Example
//!
//! ```ignore
//! use cfacts::frontend::{Frontend, SourceCache};
//! use cfacts::toolchain::SystemIncludes;
//!
//! let includes = SystemIncludes::global();
//! let args = includes.assemble_args(&["-std=c11".to_string()]);
//! let frontend = Frontend::new()?;
//! let mut json = serde_json::Value::Object(Default::default());
//! let mut cache = SourceCache::new();
//! frontend.parse(path, &args, false, |root| {
//!     cfacts::ranges::extract_ranges(root, includes, &mut json);
//! })?;
//! ```

pub mod accumulator;
pub mod callgraph;
pub mod compile_db;
pub mod diff;
pub mod error;
pub mod facts;
pub mod frontend;
pub mod macros;
pub mod paths;
pub mod ranges;
pub mod toolchain;
pub mod usage;

// Re-export commonly used types
pub use compile_db::CompileCommand;
pub use error::{ExtractError, Result};
pub use frontend::{Frontend, SourceCache, Span};
pub use macros::ScanRegistry;
pub use toolchain::SystemIncludes;
