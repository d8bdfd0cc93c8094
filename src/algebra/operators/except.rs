//! Difference: `\diff`.
//!
//! Native `EXCEPT` where the dialect has it, otherwise
//! `SELECT * FROM L WHERE NOT EXISTS (...)` (see [`super::set_common`]).

use crate::algebra::codegen::CodegenContext;
use crate::algebra::operators::set_common::{SetOpKind, gen_set_op};
use crate::algebra::tree::{RaNode, RaOp};
use crate::error::RaError;

/// Generate the view definition for a difference.
pub fn gen_except(ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Diff { left, right } = node.op() else {
        return Err(RaError::InternalError(
            "gen_except called on non-Diff node".into(),
        ));
    };
    gen_set_op(ctx, node, left, right, SetOpKind::Except)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::codegen::ViewNameGenerator;
    use crate::algebra::operators::test_helpers::*;
    use crate::dialect::Dialect;

    fn diff_node() -> RaNode {
        let mut names = ViewNameGenerator::new();
        let l = validated_table(&mut names, "R", &[("a", "INTEGER"), ("b", "INTEGER")]);
        let r = validated_table(&mut names, "S", &[("c", "INTEGER"), ("d", "INTEGER")]);
        diff(l, r, &mut names)
    }

    #[test]
    fn test_gen_except_native() {
        let sql = gen_except(&std_ctx(), &diff_node()).unwrap();
        assert_eq!(sql, "SELECT * FROM RA_TMP_VIEW_1 EXCEPT SELECT * FROM RA_TMP_VIEW_2");
    }

    #[test]
    fn test_gen_except_native_on_sqlite() {
        let sql = gen_except(&CodegenContext::new(Dialect::Sqlite), &diff_node()).unwrap();
        assert_sql_contains(&sql, " EXCEPT ");
    }

    #[test]
    fn test_gen_except_emulated() {
        let sql = gen_except(&CodegenContext::new(Dialect::MySql), &diff_node()).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM RA_TMP_VIEW_1 WHERE NOT EXISTS \
             (SELECT * FROM RA_TMP_VIEW_2 WHERE RA_TMP_VIEW_1.\"a\" = RA_TMP_VIEW_2.\"c\" \
             AND RA_TMP_VIEW_1.\"b\" = RA_TMP_VIEW_2.\"d\")"
        );
        assert_sql_not_contains(&sql, "EXCEPT");
    }

    #[test]
    fn test_gen_except_emulated_arity_mismatch() {
        let mut names = ViewNameGenerator::new();
        let l = validated_table(&mut names, "R", &[("a", "INTEGER")]);
        let r = validated_table(&mut names, "S", &[("c", "INTEGER"), ("d", "INTEGER")]);
        let node = diff(l, r, &mut names);
        let err = gen_except(&CodegenContext::new(Dialect::MySql), &node).unwrap_err();
        assert!(matches!(err, RaError::Validation { .. }));
    }

    #[test]
    fn test_gen_except_wrong_node() {
        let mut names = ViewNameGenerator::new();
        let node = union(table(&mut names, "R"), table(&mut names, "S"), &mut names);
        assert!(matches!(
            gen_except(&std_ctx(), &node),
            Err(RaError::InternalError(_))
        ));
    }
}
