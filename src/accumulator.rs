//! Structured-output accumulator
//!
//! Every extractor merges its facts into one nested JSON document. The
//! helpers here create intermediate objects on demand so that independent
//! visitors can write `file -> category -> name` paths in any order without
//! clobbering siblings. `serde_json` is built with `preserve_order`, so
//! objects keep insertion order and appended lists keep traversal order.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

/// Category sub-maps initialized for every file entry.
const FILE_CATEGORIES: [&str; 6] = [
    "functions",
    "macros",
    "enums",
    "types",
    "global_variables",
    "disabled_macros",
];

fn descend<'a>(map: &'a mut Map<String, Value>, keys: &[&str]) -> &'a mut Map<String, Value> {
    let Some((key, rest)) = keys.split_first() else {
        return map;
    };
    let entry = map
        .entry((*key).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(obj) => descend(obj, rest),
        _ => unreachable!("entry was just coerced to an object"),
    }
}

fn root_map(root: &mut Value) -> &mut Map<String, Value> {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    match root {
        Value::Object(map) => map,
        _ => unreachable!("root was just coerced to an object"),
    }
}

/// Walk/create nested objects for all but the last key, then assign the
/// leaf, overwriting any prior value at that exact path.
pub fn set(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    descend(root_map(root), parents).insert((*last).to_string(), value);
}

/// Same traversal as [`set`], but the leaf is a list: created empty on
/// first touch, then appended to in call order.
pub fn append(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let leaf = descend(root_map(root), parents)
        .entry((*last).to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !leaf.is_array() {
        *leaf = Value::Array(Vec::new());
    }
    if let Value::Array(items) = leaf {
        items.push(value);
    }
}

/// Idempotent per-file schema init: a no-op if the file key exists,
/// otherwise all category sub-maps are created empty so downstream readers
/// never need existence checks.
pub fn ensure_file_schema(root: &mut Value, file_path: &str) {
    let map = root_map(root);
    if map.contains_key(file_path) {
        return;
    }
    let mut entry = Map::new();
    for category in FILE_CATEGORIES {
        entry.insert(category.to_string(), Value::Object(Map::new()));
    }
    map.insert(file_path.to_string(), Value::Object(entry));
}

/// The uniform leaf record for one extracted source range.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub code: String,
    pub line_start: u32,
    pub line_end: u32,
}

/// Build the JSON leaf for one extracted source range.
pub fn record(code: &str, line_start: u32, line_end: u32) -> Value {
    serde_json::to_value(SourceRecord {
        code: code.to_string(),
        line_start,
        line_end,
    })
    .unwrap_or_default()
}

/// Write the accumulated document as pretty-printed JSON.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|_| ExtractError::OutputFile {
        path: path.display().to_string(),
    })?;
    fs::write(path, text).map_err(|_| ExtractError::OutputFile {
        path: path.display().to_string(),
    })
}
