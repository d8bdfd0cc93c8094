//! Shared helpers for set operators.
//!
//! Dialects without native `EXCEPT`/`INTERSECT` get a correlated
//! `[NOT] EXISTS` subquery instead, pairing columns by position:
//!
//! ```text
//! SELECT * FROM L WHERE NOT EXISTS
//!   (SELECT * FROM R WHERE L."c1" = R."d1" AND L."c2" = R."d2" ...)
//! ```
//!
//! The emulation reads both operand schemas, so it can (and must) reject
//! operands of different arity before anything reaches the database.

use crate::algebra::codegen::{CodegenContext, child_schema, equality_conjunction};
use crate::algebra::tree::RaNode;
use crate::error::RaError;

/// Which set operator is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Except,
    Intersect,
}

impl SetOpKind {
    fn keyword(self) -> &'static str {
        match self {
            SetOpKind::Except => "EXCEPT",
            SetOpKind::Intersect => "INTERSECT",
        }
    }
}

/// Generate `left <op> right`, natively or through the `EXISTS` emulation
/// depending on the dialect.
pub(crate) fn gen_set_op(
    ctx: &CodegenContext,
    node: &RaNode,
    left: &RaNode,
    right: &RaNode,
    kind: SetOpKind,
) -> Result<String, RaError> {
    if ctx.dialect.supports_except_intersect() {
        return Ok(format!(
            "SELECT * FROM {} {} SELECT * FROM {}",
            left.view_name(),
            kind.keyword(),
            right.view_name()
        ));
    }

    let predicate = positional_predicate(node, left, right)?;
    let (outer, exists) = match kind {
        SetOpKind::Except => ("SELECT *", "NOT EXISTS"),
        SetOpKind::Intersect => ("SELECT DISTINCT *", "EXISTS"),
    };
    Ok(format!(
        "{outer} FROM {l} WHERE {exists} (SELECT * FROM {r} WHERE {predicate})",
        l = left.view_name(),
        r = right.view_name(),
    ))
}

/// `left.c_i = right.c_i` for every column position, joined with `AND`.
///
/// Fails validation of `node` when the operands differ in arity.
fn positional_predicate(node: &RaNode, left: &RaNode, right: &RaNode) -> Result<String, RaError> {
    let left_schema = child_schema(left)?;
    let right_schema = child_schema(right)?;
    if left_schema.len() != right_schema.len() {
        return Err(node.validation_error(
            format!(
                "operands have different numbers of columns ({} and {})",
                left_schema.len(),
                right_schema.len()
            ),
            None,
        ));
    }
    let pairs: Vec<(&str, &str)> = left_schema
        .column_names()
        .into_iter()
        .zip(right_schema.column_names())
        .collect();
    Ok(equality_conjunction(
        left.view_name(),
        right.view_name(),
        &pairs,
    ))
}
