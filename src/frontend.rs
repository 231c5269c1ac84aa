//! Front-end session and source-text access
//!
//! The compiler front end is libclang, loaded at runtime through the `clang`
//! crate. This module owns the session plumbing (one [`Frontend`] per
//! process, one index/translation unit per parse) plus the two queries every
//! extractor needs: the spelling span of an entity's extent and the exact
//! token-range source text, recovered by slicing the file's bytes with the
//! extent's spelling offsets.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clang::{Clang, Entity, Index};

use crate::error::{ExtractError, Result};
use crate::paths::canonical_abs_path;

/// Handle to the loaded front end. Construct once per process; libclang
/// refuses a second living instance.
pub struct Frontend {
    clang: Clang,
}

impl Frontend {
    pub fn new() -> Result<Self> {
        Clang::new()
            .map(|clang| Self { clang })
            .map_err(|message| ExtractError::FrontendUnavailable { message })
    }

    /// Parse one translation unit and hand its root entity to `f`.
    ///
    /// `detailed_pp` turns on the detailed preprocessing record, which is
    /// what makes macro-definition entities visible for macro extraction.
    /// Front-end diagnostics for broken source go to stderr on their own;
    /// the parse still yields a best-effort tree.
    pub fn parse<T, F>(&self, path: &Path, args: &[String], detailed_pp: bool, f: F) -> Result<T>
    where
        F: for<'tu> FnOnce(Entity<'tu>) -> T,
    {
        let index = Index::new(&self.clang, false, true);
        let mut parser = index.parser(path);
        parser.arguments(args);
        if detailed_pp {
            parser.detailed_preprocessing_record(true);
        }
        let tu = parser.parse().map_err(|e| ExtractError::ParseFailure {
            message: e.to_string(),
        })?;
        Ok(f(tu.get_entity()))
    }
}

/// Spelling span of an entity's extent. Lines are 1-based and inclusive;
/// offsets are the half-open byte range `[start_offset, end_offset)` into
/// the spelling file, which is exactly the extent's token-range text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// File the extent starts in, as spelled (not canonicalized).
    pub file: Option<PathBuf>,
    pub start_line: u32,
    pub end_line: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Compute an entity's spelling span, or `None` when the front end has no
/// extent for it.
pub fn entity_span(entity: &Entity) -> Option<Span> {
    let range = entity.get_range()?;
    let start = range.get_start().get_spelling_location();
    let end = range.get_end().get_spelling_location();
    Some(Span {
        file: start.file.map(|f| f.get_path()),
        start_line: start.line,
        end_line: end.line,
        start_offset: start.offset as usize,
        end_offset: end.offset as usize,
    })
}

/// Canonical path of the file a declaration's *name* is spelled in.
///
/// Identity comes from the name location rather than the extent start so a
/// declaration whose leading tokens come from an include still files under
/// the right owner. `None` (no location, virtual file, unresolvable path)
/// means the declaration is skipped.
pub fn declaration_file(entity: &Entity) -> Option<String> {
    let location = entity.get_location()?.get_spelling_location();
    let file = location.file?;
    canonical_abs_path(&file.get_path().to_string_lossy())
}

/// Per-run cache of file text for token-range slicing. Read failures are
/// cached too, so a file that has vanished mid-run is probed once.
#[derive(Default)]
pub struct SourceCache {
    files: HashMap<PathBuf, Option<String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact source text of a span, or `None` when the file cannot be read
    /// or the offsets do not land on valid boundaries.
    pub fn snippet(&mut self, span: &Span) -> Option<String> {
        let file = span.file.as_ref()?;
        let text = self
            .files
            .entry(file.clone())
            .or_insert_with(|| fs::read_to_string(file).ok())
            .as_deref()?;
        text.get(span.start_offset..span.end_offset)
            .map(str::to_string)
    }
}
