//! Cartesian product: `\cross`.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a cross product.
pub fn gen_cross(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Cross { left, right } = node.op() else {
        return Err(RaError::InternalError(
            "gen_cross called on non-Cross node".into(),
        ));
    };
    Ok(cross_product_sql(left.view_name(), right.view_name()))
}

/// Product of two views. Natural join falls back to this when the
/// operands share no column.
pub(crate) fn cross_product_sql(left_view: &str, right_view: &str) -> String {
    format!("SELECT * FROM {left_view}, {right_view}")
}
