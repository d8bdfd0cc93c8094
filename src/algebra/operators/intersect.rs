//! Intersection: `\intersect`.
//!
//! Native `INTERSECT` where the dialect has it, otherwise
//! `SELECT DISTINCT * FROM L WHERE EXISTS (...)`.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::operators::set_common::{SetOpKind, gen_set_op};
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for an intersection.
pub fn gen_intersect(ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Intersect { left, right } = node.op() else {
        return Err(RaError::InternalError(
            "gen_intersect called on non-Intersect node".into(),
        ));
    };
    gen_set_op(ctx, node, left, right, SetOpKind::Intersect)
}
