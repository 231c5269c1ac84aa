//! Canonical file identity
//!
//! Every fact in the output is keyed by an absolute, symlink-resolved path.
//! Two references to the same on-disk file must normalize to the identical
//! string, otherwise facts for one file fragment across aliases.

use std::path::Path;

/// Resolve a path to its canonical absolute form.
///
/// Returns `None` when the path is empty or cannot be resolved (missing
/// file, permission error). Callers treat `None` as the "file not found"
/// signal and skip the declaration rather than failing the traversal.
pub fn canonical_abs_path(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    Path::new(path)
        .canonicalize()
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}
