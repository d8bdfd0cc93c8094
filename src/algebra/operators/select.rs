//! Selection: `\select_{condition}`.
//!
//! The condition is passed through verbatim; the database checks it.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a selection.
pub fn gen_select(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Select { condition, child } = node.op() else {
        return Err(RaError::InternalError(
            "gen_select called on non-Select node".into(),
        ));
    };
    Ok(format!(
        "SELECT * FROM {} WHERE {condition}",
        child.view_name()
    ))
}
