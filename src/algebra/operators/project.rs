//! Projection: `\project_{columns}`.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a projection.
///
/// Projection can introduce duplicates, so the result is made distinct.
pub fn gen_project(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Project { columns, child } = node.op() else {
        return Err(RaError::InternalError(
            "gen_project called on non-Project node".into(),
        ));
    };
    Ok(format!(
        "SELECT DISTINCT {columns} FROM {}",
        child.view_name()
    ))
}
