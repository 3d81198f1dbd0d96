//! Unsupported-node tracking
//!
//! Finds the markers left in a query tree so callers can decide, before
//! printing, whether to evaluate the query locally instead.

use crate::query::{QueryNode, UnsupportedNode};
use crate::{CompileError, CompileResult};

/// Whether the tree contains no unsupported markers
pub fn is_representable(node: &QueryNode) -> bool {
    !node.is_unsupported() && node.children().into_iter().all(is_representable)
}

/// Collect the markers where constructs were rejected, in tree order
pub fn collect(node: &QueryNode) -> Vec<&UnsupportedNode> {
    let mut markers = Vec::new();
    collect_into(node, &mut markers);
    markers
}

fn collect_into<'a>(node: &'a QueryNode, markers: &mut Vec<&'a UnsupportedNode>) {
    match node.as_unsupported() {
        Some(marker) if marker.is_origin() => markers.push(marker),
        Some(marker) => {
            let before = markers.len();
            for child in marker.nested() {
                collect_into(child, markers);
            }
            // A propagated marker with no origin below it stands for itself
            if markers.len() == before {
                markers.push(marker);
            }
        }
        None => {
            for child in node.children() {
                collect_into(child, markers);
            }
        }
    }
}

/// Convert one marker into the error reported for it
pub fn to_error(marker: &UnsupportedNode) -> CompileError {
    CompileError::UnsupportedConstruct {
        expression: marker.expression().to_string(),
        cause: marker.cause().cloned(),
    }
}

/// Fail with the tracked error when the tree is not representable.
///
/// A single marker surfaces as its own error; several are aggregated.
pub fn ensure_representable(node: &QueryNode) -> CompileResult<()> {
    let mut errors: Vec<CompileError> = collect(node).into_iter().map(to_error).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(CompileError::AggregateUnsupported(errors)),
    }
}
