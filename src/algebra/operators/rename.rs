//! Renaming: `\rename_{new1, new2, ...}`.
//!
//! Every output column is renamed, by position. Where the dialect allows a
//! view to declare its column names the view is simply
//! `CREATE VIEW v(new1, ...) AS SELECT * FROM child`. Otherwise the select
//! list is spelled out as `"old_i" AS new_i`, which requires the child's
//! schema and a matching column count.

use crate::algebra::codegen::{CodegenContext, child_schema, quote_ident, split_column_list};
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a rename.
pub fn gen_rename(ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Rename { columns, child } = node.op() else {
        return Err(RaError::InternalError(
            "gen_rename called on non-Rename node".into(),
        ));
    };

    if ctx.dialect.supports_view_column_list() {
        return Ok(format!("SELECT * FROM {}", child.view_name()));
    }

    let old_names = child_schema(child)?.column_names();
    let new_names = split_column_list(columns);
    if old_names.len() != new_names.len() {
        return Err(node.validation_error("renaming an incorrect number of columns", None));
    }
    let select_list = old_names
        .iter()
        .zip(&new_names)
        .map(|(old, new)| format!("{} AS {new}", quote_ident(old)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("SELECT {select_list} FROM {}", child.view_name()))
}

/// Generate the `CREATE VIEW` statement for a rename.
pub fn gen_rename_create(ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Rename { columns, .. } = node.op() else {
        return Err(RaError::InternalError(
            "gen_rename_create called on non-Rename node".into(),
        ));
    };
    let definition = gen_rename(ctx, node)?;
    if ctx.dialect.supports_view_column_list() {
        Ok(format!(
            "CREATE VIEW {}({columns}) AS {definition}",
            node.view_name()
        ))
    } else {
        Ok(format!("CREATE VIEW {} AS {definition}", node.view_name()))
    }
}
