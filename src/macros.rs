//! Macro reconciliation engine
//!
//! Macros get two views per file. The *enabled* view comes from the front
//! end's preprocessing record: one entry per macro name that was actually
//! defined on the active conditional-compilation branch, last definition
//! winning. The *disabled candidate* view comes from a raw textual scan of
//! the file: every `#define` directive present in the literal source,
//! whatever its `#if` guards say, as a list per name. After all translation
//! units have been processed, [`reconcile`] removes every candidate whose
//! text matches the enabled definition, leaving exactly the definitions that
//! exist in the text but were never compiled in.

use std::collections::HashSet;
use std::fs;
use std::sync::{Mutex, OnceLock};

use clang::{Entity, EntityKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::accumulator::{append, ensure_file_schema, record, set};
use crate::frontend::{declaration_file, entity_span, SourceCache};
use crate::toolchain::SystemIncludes;

/// A `#define` directive, anchored at line start with optional whitespace
/// around the `#`.
static DEFINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\s*define\b").unwrap());

static SCAN_REGISTRY: OnceLock<ScanRegistry> = OnceLock::new();

/// Process-wide set of files whose disabled-candidate scan already ran.
///
/// The scan must fire at most once per distinct file path for the lifetime
/// of the run, however many declarations or translation units touch the
/// file. Tests construct their own registry; tools share [`ScanRegistry::global`].
#[derive(Debug, Default)]
pub struct ScanRegistry {
    visited: Mutex<HashSet<String>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static ScanRegistry {
        SCAN_REGISTRY.get_or_init(Self::new)
    }

    /// True exactly once per path.
    fn first_visit(&self, path: &str) -> bool {
        let Ok(mut visited) = self.visited.lock() else {
            return false;
        };
        visited.insert(path.to_string())
    }
}

/// One textually-found `#define`, continuation lines folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCandidate {
    pub name: String,
    pub code: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Extract the macro name from a (possibly folded) directive line: the text
/// after `define`, trimmed, truncated at the first space, tab, or `(`.
fn macro_name(line: &str) -> Option<String> {
    let pos = line.find("define")?;
    let rest = line[pos + "define".len()..].trim_start();
    let end = rest.find([' ', '\t', '(']).unwrap_or(rest.len());
    let name = rest[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Line-scan raw file text for `#define` directives, independent of
/// conditional-compilation state. Backslash-continued definitions are
/// concatenated with embedded newlines, each continuation line stripped.
/// Lines are 1-based and inclusive.
pub fn scan_disabled_candidates(text: &str) -> Vec<MacroCandidate> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        let start_line = (index + 1) as u32;
        index += 1;

        if !DEFINE_RE.is_match(line) {
            continue;
        }

        let mut code = line.trim().to_string();
        let mut end_line = start_line;
        let mut current = line;
        while current.ends_with('\\') && index < lines.len() {
            current = lines[index];
            end_line = (index + 1) as u32;
            index += 1;
            code.push('\n');
            code.push_str(current.trim());
        }

        if let Some(name) = macro_name(&code) {
            out.push(MacroCandidate {
                name,
                code,
                start_line,
                end_line,
            });
        }
    }
    out
}

/// Run the disabled-candidate scan for `file_path` and append the results
/// under its `disabled_macros` lists. At most once per path per registry;
/// an unreadable file is logged and stays marked as visited.
pub fn scan_file(json: &mut Value, file_path: &str, registry: &ScanRegistry) {
    if !registry.first_visit(file_path) {
        return;
    }
    let text = match fs::read_to_string(file_path) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to open {file_path} for macro scan: {e}");
            return;
        }
    };
    for candidate in scan_disabled_candidates(&text) {
        append(
            json,
            &[file_path, "disabled_macros", &candidate.name],
            record(&candidate.code, candidate.start_line, candidate.end_line),
        );
    }
}

/// Record every enabled macro definition found in a translation unit parsed
/// with the detailed preprocessing record.
///
/// For each user-file definition: the file schema is ensured, the disabled
/// scan for that file is triggered, and `macros.<name>` is set to the
/// directive text (`#define ` + extent text) with its spelling span. A
/// redefinition overwrites: last writer wins.
pub fn record_enabled_macros(
    root: Entity,
    json: &mut Value,
    cache: &mut SourceCache,
    includes: &SystemIncludes,
    registry: &ScanRegistry,
) {
    for entity in root.get_children() {
        if entity.get_kind() != EntityKind::MacroDefinition {
            continue;
        }
        let Some(name) = entity.get_name().filter(|n| !n.is_empty()) else {
            continue;
        };
        let Some(file) = declaration_file(&entity) else {
            continue;
        };
        if includes.is_system_file(&file) {
            continue;
        }
        let Some(span) = entity_span(&entity) else {
            continue;
        };
        let Some(body) = cache.snippet(&span) else {
            continue;
        };

        ensure_file_schema(json, &file);
        scan_file(json, &file, registry);

        let code = format!("#define {body}");
        set(
            json,
            &[&file, "macros", &name],
            record(&code, span.start_line, span.end_line),
        );
    }
}

/// Remove, per file and macro name, every disabled candidate whose text
/// exactly equals the enabled definition, then drop names whose candidate
/// list emptied. Names with no enabled entry are left untouched — those are
/// the macros that never compiled in under the flags of this run.
///
/// Must run only after every translation unit of the run has been
/// processed: a macro disabled under one invocation's flags may be enabled
/// under another's.
pub fn reconcile(root: &mut Value) {
    let Some(files) = root.as_object_mut() else {
        return;
    };
    for entry in files.values_mut() {
        let Some(file_entry) = entry.as_object_mut() else {
            continue;
        };

        let enabled: Vec<(String, String)> = file_entry
            .get("macros")
            .and_then(Value::as_object)
            .map(|macros| {
                macros
                    .iter()
                    .filter_map(|(name, info)| {
                        info.get("code")
                            .and_then(Value::as_str)
                            .map(|code| (name.clone(), code.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let Some(disabled) = file_entry
            .get_mut("disabled_macros")
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        for (name, enabled_code) in &enabled {
            if let Some(candidates) = disabled.get_mut(name).and_then(Value::as_array_mut) {
                candidates.retain(|candidate| {
                    candidate.get("code").and_then(Value::as_str) != Some(enabled_code.as_str())
                });
            }
        }

        disabled.retain(|_, candidates| candidates.as_array().map_or(true, |c| !c.is_empty()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_macro_name_simple() {
        assert_eq!(macro_name("#define FOO 1"), Some("FOO".to_string()));
    }

    #[test]
    fn test_macro_name_function_like() {
        assert_eq!(macro_name("#define MAX(a, b) ((a) > (b))"), Some("MAX".to_string()));
    }

    #[test]
    fn test_macro_name_spaced_hash() {
        assert_eq!(macro_name("#  define  BAR baz"), Some("BAR".to_string()));
    }

    #[test]
    fn test_macro_name_bare() {
        assert_eq!(macro_name("#define GUARD_H"), Some("GUARD_H".to_string()));
    }

    #[test]
    fn test_macro_name_missing_is_none() {
        assert_eq!(macro_name("#define"), None);
    }

    #[test]
    fn test_scan_finds_directives_and_spans() {
        let text = "int x;\n#define FOO 1\n  # define BAR 2\n";
        let found = scan_disabled_candidates(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "FOO");
        assert_eq!(found[0].code, "#define FOO 1");
        assert_eq!(found[0].start_line, 2);
        assert_eq!(found[0].end_line, 2);
        assert_eq!(found[1].name, "BAR");
        assert_eq!(found[1].code, "# define BAR 2");
    }

    #[test]
    fn test_scan_ignores_non_directives() {
        let text = "// #define COMMENTED out? no: line start only counts\nint defined_thing;\n";
        assert!(scan_disabled_candidates(text).is_empty());
    }

    #[test]
    fn test_scan_folds_continuation_lines() {
        let text = "#define SWAP(a, b) \\\n  do {            \\\n    (a) ^= (b);   \\\n  } while (0)\nint y;\n";
        let found = scan_disabled_candidates(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "SWAP");
        assert_eq!(found[0].start_line, 1);
        assert_eq!(found[0].end_line, 4);
        assert_eq!(
            found[0].code,
            "#define SWAP(a, b) \\\ndo {            \\\n(a) ^= (b);   \\\n} while (0)"
        );
    }

    #[test]
    fn test_scan_records_every_redefinition() {
        let text = "#define FOO 1\n#ifdef NEVER\n#define FOO 2\n#endif\n";
        let found = scan_disabled_candidates(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].code, "#define FOO 1");
        assert_eq!(found[1].code, "#define FOO 2");
        assert_eq!(found[1].start_line, 3);
    }

    #[test]
    fn test_scan_file_runs_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.c");
        std::fs::write(&file, "#define ONCE 1\n").unwrap();
        let path = file.to_str().unwrap();

        let registry = ScanRegistry::new();
        let mut json = Value::Object(Map::new());
        scan_file(&mut json, path, &registry);
        scan_file(&mut json, path, &registry);

        assert_eq!(
            json[path]["disabled_macros"]["ONCE"].as_array().unwrap().len(),
            1
        );
    }

    /// `#define FOO 1` compiled in, `#define FOO 2` behind `#ifdef NEVER`:
    /// reconciliation keeps only the never-compiled definition.
    #[test]
    fn test_reconcile_removes_enabled_duplicate() {
        let mut json = json!({
            "/a.c": {
                "macros": {
                    "FOO": {"code": "#define FOO 1", "line_start": 1, "line_end": 1}
                },
                "disabled_macros": {
                    "FOO": [
                        {"code": "#define FOO 1", "line_start": 1, "line_end": 1},
                        {"code": "#define FOO 2", "line_start": 3, "line_end": 3}
                    ]
                }
            }
        });

        reconcile(&mut json);

        let remaining = json["/a.c"]["disabled_macros"]["FOO"].as_array().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["code"], json!("#define FOO 2"));
        // The enabled record is untouched.
        assert_eq!(json["/a.c"]["macros"]["FOO"]["code"], json!("#define FOO 1"));
    }

    #[test]
    fn test_reconcile_drops_name_when_list_empties() {
        let mut json = json!({
            "/a.c": {
                "macros": {
                    "ONLY": {"code": "#define ONLY 1", "line_start": 1, "line_end": 1}
                },
                "disabled_macros": {
                    "ONLY": [{"code": "#define ONLY 1", "line_start": 1, "line_end": 1}]
                }
            }
        });

        reconcile(&mut json);

        assert!(json["/a.c"]["disabled_macros"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_reconcile_keeps_never_enabled_macros() {
        let mut json = json!({
            "/a.c": {
                "macros": {},
                "disabled_macros": {
                    "GHOST": [{"code": "#define GHOST 1", "line_start": 7, "line_end": 7}]
                }
            }
        });

        let before = json.clone();
        reconcile(&mut json);
        assert_eq!(json, before);
    }
}
