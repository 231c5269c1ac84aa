//! Call-graph builder
//!
//! Walks the function definitions of one translation unit, restricted to
//! the primary file under analysis, classifies each outgoing call site, and
//! records bidirectional caller/callee edges. Call expressions that cannot
//! be attributed to a statically-known function — indirect calls through
//! pointers, overloaded-operator invocations, anything unrecognized — are
//! logged and skipped rather than recorded as synthetic edges.

use clang::{Entity, EntityKind};
use serde_json::{json, Value};
use tracing::warn;

use crate::frontend::declaration_file;

/// Classification of one call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Plain function call with a statically-known callee.
    Direct(String),
    /// Constructor invocation; the callee is the constructed type's name.
    Constructor(String),
    /// Member call through a resolved method.
    Member(String),
    /// Overloaded operator invoked via operator syntax. Deliberately not a
    /// call edge in this design; recorded here only for the diagnostic.
    Operator(String),
    /// Indirect call with no statically-known target.
    Unresolved,
    /// Anything else (unresolvable name, unexpected referenced kind).
    Unclassified,
}

/// Classify a call expression by what it references.
pub fn classify(call: &Entity) -> CallTarget {
    let Some(referenced) = call.get_reference() else {
        return CallTarget::Unresolved;
    };
    let name = referenced.get_name().unwrap_or_default();
    if name.is_empty() {
        return CallTarget::Unclassified;
    }
    match referenced.get_kind() {
        EntityKind::Constructor => CallTarget::Constructor(name),
        EntityKind::Method | EntityKind::Destructor | EntityKind::ConversionFunction => {
            if is_operator_name(&name) {
                CallTarget::Operator(name)
            } else {
                CallTarget::Member(name)
            }
        }
        EntityKind::FunctionDecl | EntityKind::FunctionTemplate => {
            if is_operator_name(&name) {
                CallTarget::Operator(name)
            } else {
                CallTarget::Direct(name)
            }
        }
        // A referenced variable or parameter means a call through a
        // function pointer.
        EntityKind::VarDecl | EntityKind::ParmDecl | EntityKind::FieldDecl => {
            CallTarget::Unresolved
        }
        _ => CallTarget::Unclassified,
    }
}

/// `operator==`, `operator+`, `operator bool`, ... but not identifiers that
/// merely start with the word (`operator_table`).
fn is_operator_name(name: &str) -> bool {
    name.strip_prefix("operator")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| !c.is_alphanumeric() && c != '_')
}

/// Build the graph for every function definition located in `main_file`.
pub fn build_callgraph(root: Entity, main_file: &str, json: &mut Value) {
    walk(&root, main_file, json);
}

fn walk(entity: &Entity, main_file: &str, json: &mut Value) {
    for child in entity.get_children() {
        if is_function_kind(child.get_kind()) {
            visit_function(&child, main_file, json);
        }
        walk(&child, main_file, json);
    }
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

fn visit_function(entity: &Entity, main_file: &str, json: &mut Value) {
    if !entity.is_definition() {
        return;
    }
    let Some(caller) = entity.get_name().filter(|n| !n.is_empty()) else {
        return;
    };
    // Single-TU tool: only the primary file's functions are recorded.
    if declaration_file(entity).as_deref() != Some(main_file) {
        return;
    }

    for call in collect_calls(entity) {
        match classify(&call) {
            CallTarget::Direct(callee)
            | CallTarget::Constructor(callee)
            | CallTarget::Member(callee) => add_edge(json, &caller, &callee),
            CallTarget::Operator(op) => {
                warn!("skipping operator call {op} in function {caller}");
            }
            CallTarget::Unresolved => {
                warn!("skipping indirect call expression in function {caller}");
            }
            CallTarget::Unclassified => {
                warn!("skipping unclassified call expression in function {caller}");
            }
        }
    }
}

fn collect_calls<'tu>(entity: &Entity<'tu>) -> Vec<Entity<'tu>> {
    fn rec<'tu>(entity: &Entity<'tu>, out: &mut Vec<Entity<'tu>>) {
        for child in entity.get_children() {
            if child.get_kind() == EntityKind::CallExpr {
                out.push(child);
            }
            rec(&child, out);
        }
    }
    let mut out = Vec::new();
    rec(entity, &mut out);
    out
}

/// Insert `callee` into the caller's `callees` and `caller` into the
/// callee's `callers`, creating either node (with empty edge lists) on
/// first reference. Duplicate edges are suppressed on both sides.
pub fn add_edge(json: &mut Value, caller: &str, callee: &str) {
    ensure_node(json, caller);
    ensure_node(json, callee);
    push_unique(&mut json[caller]["callees"], callee);
    push_unique(&mut json[callee]["callers"], caller);
}

fn ensure_node(json: &mut Value, name: &str) {
    let Some(map) = json.as_object_mut() else {
        return;
    };
    map.entry(name.to_string())
        .or_insert_with(|| json!({"callees": [], "callers": []}));
}

fn push_unique(list: &mut Value, value: &str) {
    if let Some(items) = list.as_array_mut() {
        if !items.iter().any(|item| item.as_str() == Some(value)) {
            items.push(json!(value));
        }
    }
}
