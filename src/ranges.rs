//! Function-level source queries
//!
//! Two narrow traversals over function definitions: the line-span map used
//! by the ranges tool, and the exact-source lookup for one named function
//! used by the funcsrc tool.

use clang::{Entity, EntityKind};
use serde::Serialize;
use serde_json::Value;

use crate::accumulator::set;
use crate::frontend::{declaration_file, entity_span, SourceCache};
use crate::toolchain::SystemIncludes;

/// Line span of one function definition.
#[derive(Debug, Clone, Copy, Serialize)]
struct LineRange {
    begin: u32,
    end: u32,
}

fn is_function_kind(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::FunctionDecl
            | EntityKind::Method
            | EntityKind::Constructor
            | EntityKind::Destructor
            | EntityKind::ConversionFunction
            | EntityKind::FunctionTemplate
    )
}

/// Record `{file: {function: {begin, end}}}` line spans for every function
/// definition in user code.
pub fn extract_ranges(root: Entity, includes: &SystemIncludes, json: &mut Value) {
    fn rec(entity: &Entity, includes: &SystemIncludes, json: &mut Value) {
        for child in entity.get_children() {
            if is_function_kind(child.get_kind()) {
                visit(&child, includes, json);
            }
            rec(&child, includes, json);
        }
    }
    rec(&root, includes, json);
}

fn visit(entity: &Entity, includes: &SystemIncludes, json: &mut Value) {
    if !entity.is_definition() {
        return;
    }
    let Some(name) = entity.get_name().filter(|n| !n.is_empty()) else {
        return;
    };
    let Some(file) = declaration_file(entity) else {
        return;
    };
    if includes.is_system_file(&file) {
        return;
    }
    let Some(span) = entity_span(entity) else {
        return;
    };
    let range = LineRange {
        begin: span.start_line,
        end: span.end_line,
    };
    set(
        json,
        &[&file, &name],
        serde_json::to_value(range).unwrap_or_default(),
    );
}

/// Exact source text of the function named `target`, restricted to
/// definitions located in `main_file`. `None` when no such definition
/// exists in the translation unit.
pub fn function_source(
    root: Entity,
    target: &str,
    main_file: &str,
    cache: &mut SourceCache,
) -> Option<String> {
    fn rec(
        entity: &Entity,
        target: &str,
        main_file: &str,
        cache: &mut SourceCache,
    ) -> Option<String> {
        for child in entity.get_children() {
            if is_function_kind(child.get_kind())
                && child.is_definition()
                && child.get_name().as_deref() == Some(target)
                && declaration_file(&child).as_deref() == Some(main_file)
            {
                if let Some(code) = entity_span(&child).and_then(|span| cache.snippet(&span)) {
                    return Some(code);
                }
            }
            if let Some(found) = rec(&child, target, main_file, cache) {
                return Some(found);
            }
        }
        None
    }
    rec(&root, target, main_file, cache)
}
