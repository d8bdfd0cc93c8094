//! Base relation.
//!
//! A base relation may be a bag; its view keeps set semantics by
//! selecting distinct rows.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a base relation.
pub fn gen_table(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Table { name } = node.op() else {
        return Err(RaError::InternalError(
            "gen_table called on non-Table node".into(),
        ));
    };
    Ok(format!("SELECT DISTINCT * FROM {name}"))
}
