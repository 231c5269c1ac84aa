//! Declaration visitors
//!
//! One recursive pass over a translation unit's declaration tree, collecting
//! function definitions, variables, typedefs, records, and enums into the
//! accumulator under their owning file. System files are filtered out, and
//! any declaration that cannot be resolved (no name, no mappable location,
//! unresolvable path) is skipped silently so a single odd declaration never
//! aborts extraction of a large corpus.

use clang::{Entity, EntityKind};
use serde_json::{json, Value};
use tracing::debug;

use crate::accumulator::{ensure_file_schema, record, set};
use crate::frontend::{declaration_file, entity_span, SourceCache, Span};
use crate::macros::{scan_file, ScanRegistry};
use crate::toolchain::SystemIncludes;

/// Shared state for one extraction pass.
pub struct FactsContext<'a> {
    pub json: &'a mut Value,
    pub cache: &'a mut SourceCache,
    pub includes: &'a SystemIncludes,
    pub registry: &'a ScanRegistry,
}

/// Walk the whole declaration tree under `root` and collect facts.
pub fn extract_facts(root: Entity, ctx: &mut FactsContext) {
    walk(&root, ctx);
}

fn walk(entity: &Entity, ctx: &mut FactsContext) {
    for child in entity.get_children() {
        visit(&child, ctx);
        walk(&child, ctx);
    }
}

fn visit(entity: &Entity, ctx: &mut FactsContext) {
    match entity.get_kind() {
        EntityKind::FunctionDecl
        | EntityKind::Method
        | EntityKind::Constructor
        | EntityKind::Destructor
        | EntityKind::ConversionFunction
        | EntityKind::FunctionTemplate => visit_function(entity, ctx),
        EntityKind::VarDecl | EntityKind::ParmDecl => visit_variable(entity, ctx),
        EntityKind::TypedefDecl
        | EntityKind::TypeAliasDecl
        | EntityKind::StructDecl
        | EntityKind::ClassDecl
        | EntityKind::UnionDecl => visit_named_decl(entity, ctx, "types"),
        EntityKind::EnumDecl => visit_named_decl(entity, ctx, "enums"),
        _ => {}
    }
}

/// Resolve the common per-declaration preconditions: non-empty name, a
/// user-code owning file, a source span with readable text. Also makes sure
/// the file's schema and disabled-macro scan are in place before the first
/// record for that file is written.
fn resolve(entity: &Entity, ctx: &mut FactsContext) -> Option<(String, String, Span, String)> {
    let name = entity.get_name().filter(|n| !n.is_empty())?;
    let file = declaration_file(entity)?;
    if ctx.includes.is_system_file(&file) {
        return None;
    }
    let span = entity_span(entity)?;
    let code = ctx.cache.snippet(&span)?;

    ensure_file_schema(ctx.json, &file);
    scan_file(ctx.json, &file, ctx.registry);

    Some((name, file, span, code))
}

fn visit_function(entity: &Entity, ctx: &mut FactsContext) {
    if !entity.is_definition() {
        return;
    }
    let Some((name, file, span, code)) = resolve(entity, ctx) else {
        debug!("skipping unresolvable function declaration");
        return;
    };

    // Field-wise writes: the function entry may already hold nested
    // local_variables.
    set(ctx.json, &[&file, "functions", &name, "code"], json!(code));
    set(
        ctx.json,
        &[&file, "functions", &name, "line_start"],
        json!(span.start_line),
    );
    set(
        ctx.json,
        &[&file, "functions", &name, "line_end"],
        json!(span.end_line),
    );
}

fn visit_variable(entity: &Entity, ctx: &mut FactsContext) {
    let Some((name, file, span, code)) = resolve(entity, ctx) else {
        return;
    };

    match enclosing_function_name(entity) {
        Some(function) => set(
            ctx.json,
            &[&file, "functions", &function, "local_variables", &name],
            record(&code, span.start_line, span.end_line),
        ),
        // No enclosing function: file-scope variable.
        None => set(
            ctx.json,
            &[&file, "global_variables", &name],
            record(&code, span.start_line, span.end_line),
        ),
    }
}

fn visit_named_decl(entity: &Entity, ctx: &mut FactsContext, category: &str) {
    let Some((name, file, span, code)) = resolve(entity, ctx) else {
        return;
    };
    set(
        ctx.json,
        &[&file, category, &name],
        record(&code, span.start_line, span.end_line),
    );
}

/// Name of the nearest enclosing function along the lexical parent chain,
/// or `None` at file scope.
fn enclosing_function_name(entity: &Entity) -> Option<String> {
    let mut current = entity.get_lexical_parent();
    while let Some(parent) = current {
        match parent.get_kind() {
            EntityKind::FunctionDecl
            | EntityKind::Method
            | EntityKind::Constructor
            | EntityKind::Destructor
            | EntityKind::ConversionFunction
            | EntityKind::FunctionTemplate => return parent.get_name().filter(|n| !n.is_empty()),
            EntityKind::TranslationUnit => return None,
            _ => current = parent.get_lexical_parent(),
        }
    }
    None
}
