//! Per-function operand-usage visitors
//!
//! Narrow extraction inside function bodies: assignment expressions with
//! both operand types, and address-of expressions with the object type.
//! libclang does not expose operator opcodes directly, so the operator
//! spelling is recovered from the token stream: for a binary operator, the
//! first punctuation token at or after the end of the left operand's extent.

use clang::token::TokenKind;
use clang::{Entity, EntityKind};
use serde_json::{json, Value};
use tracing::debug;

use crate::accumulator::append;
use crate::frontend::{declaration_file, entity_span, SourceCache};
use crate::toolchain::SystemIncludes;

/// Extract assignment and address-of usage for every function definition in
/// user code.
pub fn extract_usage(
    root: Entity,
    includes: &SystemIncludes,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    fn rec(
        entity: &Entity,
        includes: &SystemIncludes,
        json: &mut Value,
        cache: &mut SourceCache,
    ) {
        for child in entity.get_children() {
            if is_function_kind(child.get_kind()) {
                visit_function(&child, includes, json, cache);
            }
            rec(&child, includes, json, cache);
        }
    }
    rec(&root, includes, json, cache);
}

fn is_function_kind(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::FunctionDecl
            | EntityKind::Method
            | EntityKind::Constructor
            | EntityKind::Destructor
            | EntityKind::ConversionFunction
    )
}

fn visit_function(
    entity: &Entity,
    includes: &SystemIncludes,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    if !entity.is_definition() {
        return;
    }
    let Some(function) = entity.get_name().filter(|n| !n.is_empty()) else {
        return;
    };
    let Some(file) = declaration_file(entity) else {
        return;
    };
    if includes.is_system_file(&file) {
        return;
    }
    scan_body(entity, &file, &function, json, cache);
}

fn scan_body(
    entity: &Entity,
    file: &str,
    function: &str,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    for child in entity.get_children() {
        match child.get_kind() {
            EntityKind::BinaryOperator => {
                if operator_spelling(&child).as_deref() == Some("=") {
                    record_assignment(&child, file, function, json, cache);
                }
            }
            EntityKind::CompoundAssignOperator => {
                record_assignment(&child, file, function, json, cache);
            }
            EntityKind::UnaryOperator => {
                if is_address_of(&child) {
                    record_address_of(&child, file, function, json, cache);
                }
            }
            _ => {}
        }
        scan_body(&child, file, function, json, cache);
    }
}

/// Spelling of a binary operator: the first punctuation token at or past
/// the left operand's extent end.
fn operator_spelling(entity: &Entity) -> Option<String> {
    let children = entity.get_children();
    let lhs = children.first()?;
    let lhs_end = lhs.get_range()?.get_end().get_spelling_location().offset;
    entity
        .get_range()?
        .tokenize()
        .into_iter()
        .find(|token| {
            token.get_kind() == TokenKind::Punctuation
                && token.get_location().get_spelling_location().offset >= lhs_end
        })
        .map(|token| token.get_spelling())
}

/// True for a prefix `&` operator: the expression's first token is a lone
/// ampersand.
fn is_address_of(entity: &Entity) -> bool {
    let Some(range) = entity.get_range() else {
        return false;
    };
    let start = range.get_start().get_spelling_location().offset;
    range
        .tokenize()
        .into_iter()
        .find(|token| token.get_location().get_spelling_location().offset == start)
        .map_or(false, |token| token.get_spelling() == "&")
}

fn type_names(entity: &Entity) -> Vec<String> {
    entity
        .get_type()
        .map(|ty| vec![ty.get_display_name()])
        .unwrap_or_default()
}

fn record_assignment(
    entity: &Entity,
    file: &str,
    function: &str,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    let children = entity.get_children();
    let (Some(lhs), Some(rhs)) = (children.first(), children.get(1)) else {
        debug!("skipping assignment without two operands in {function}");
        return;
    };
    let Some(span) = entity_span(entity) else {
        return;
    };
    let Some(code) = cache.snippet(&span) else {
        return;
    };

    let info = json!({
        "code": code,
        "line_start": span.start_line,
        "line_end": span.end_line,
        "lhs_type": type_names(lhs),
        "rhs_type": type_names(rhs),
    });
    append(json, &[file, "functions", function, "assignments"], info);
}

fn record_address_of(
    entity: &Entity,
    file: &str,
    function: &str,
    json: &mut Value,
    cache: &mut SourceCache,
) {
    let children = entity.get_children();
    let Some(operand) = children.first() else {
        return;
    };
    let Some(span) = entity_span(entity) else {
        return;
    };
    let Some(code) = cache.snippet(&span) else {
        return;
    };

    let info = json!({
        "code": code,
        "line_start": span.start_line,
        "line_end": span.end_line,
        "object_type": type_names(operand),
    });
    append(json, &[file, "functions", function, "address_usages"], info);
}
