//! Union: `\union`.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a union. `UNION` removes duplicates
/// on every supported dialect.
pub fn gen_union(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Union { left, right } = node.op() else {
        return Err(RaError::InternalError(
            "gen_union called on non-Union node".into(),
        ));
    };
    Ok(format!(
        "SELECT * FROM {} UNION SELECT * FROM {}",
        left.view_name(),
        right.view_name()
    ))
}
