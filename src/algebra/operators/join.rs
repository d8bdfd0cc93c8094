//! Join: `\join_{condition}` (theta) and `\join` (natural).
//!
//! A theta join is a filtered product. A natural join equates every column
//! name the operands share and keeps one copy of each shared column:
//!
//! ```text
//! SELECT V1."l1", ..., V1."ln", V2."r1", ..., V2."rk"
//! FROM left AS V1, right AS V2
//! WHERE V1."s1" = V2."s1" AND ...
//! ```
//!
//! where `l*` are all left columns, `r*` the right columns not shared and
//! `s*` the shared names. Column names are compared case-insensitively.

use crate::algebra::codegen::{
    CodegenContext, child_schema, equality_conjunction, qualified_col_list,
};
use crate::algebra::operators::cross::cross_product_sql;
use crate::algebra::tree::{RaNode, RaOp};
use crate::db::TableSchema;
use crate::error::RaError;

const LEFT_ALIAS: &str = "V1";
const RIGHT_ALIAS: &str = "V2";

/// Generate the view definition for a join.
pub fn gen_join(_ctx: &CodegenContext, node: &RaNode) -> Result<String, RaError> {
    let RaOp::Join {
        condition,
        left,
        right,
    } = node.op()
    else {
        return Err(RaError::InternalError(
            "gen_join called on non-Join node".into(),
        ));
    };

    match condition {
        Some(cond) => Ok(format!(
            "SELECT * FROM {}, {} WHERE {cond}",
            left.view_name(),
            right.view_name()
        )),
        None => natural_join_sql(left, right),
    }
}

fn natural_join_sql(left: &RaNode, right: &RaNode) -> Result<String, RaError> {
    let left_schema = child_schema(left)?;
    let right_schema = child_schema(right)?;
    let shared = shared_columns(left_schema, right_schema);

    if shared.is_empty() {
        return Ok(cross_product_sql(left.view_name(), right.view_name()));
    }

    let right_only: Vec<&str> = right_schema
        .column_names()
        .into_iter()
        .filter(|r| !shared.iter().any(|(_, s)| *s == *r))
        .collect();

    let mut select_list = qualified_col_list(LEFT_ALIAS, &left_schema.column_names());
    if !right_only.is_empty() {
        select_list.push_str(", ");
        select_list.push_str(&qualified_col_list(RIGHT_ALIAS, &right_only));
    }

    Ok(format!(
        "SELECT {select_list} FROM {} AS {LEFT_ALIAS}, {} AS {RIGHT_ALIAS} WHERE {}",
        left.view_name(),
        right.view_name(),
        equality_conjunction(LEFT_ALIAS, RIGHT_ALIAS, &shared),
    ))
}

/// Shared column names as `(left spelling, right spelling)` pairs, in the
/// right operand's column order.
pub fn shared_columns<'a>(
    left: &'a TableSchema,
    right: &'a TableSchema,
) -> Vec<(&'a str, &'a str)> {
    let left_names = left.column_names();
    right
        .column_names()
        .into_iter()
        .filter_map(|r| {
            left_names
                .iter()
                .find(|l| l.eq_ignore_ascii_case(r))
                .map(|l| (*l, r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::codegen::ViewNameGenerator;
    use crate::algebra::operators::test_helpers::*;

    fn natural(left: &[(&str, &str)], right: &[(&str, &str)]) -> String {
        let mut names = ViewNameGenerator::new();
        let l = validated_table(&mut names, "R", left);
        let r = validated_table(&mut names, "S", right);
        let node = join(l, r, &mut names);
        gen_join(&std_ctx(), &node).unwrap()
    }

    #[test]
    fn test_theta_join_uses_condition_only() {
        let mut names = ViewNameGenerator::new();
        let node = theta_join(
            "R.a = S.c",
            table(&mut names, "R"),
            table(&mut names, "S"),
            &mut names,
        );
        let sql = gen_join(&std_ctx(), &node).unwrap();
        assert_eq!(sql, "SELECT * FROM RA_TMP_VIEW_1, RA_TMP_VIEW_2 WHERE R.a = S.c");
    }

    #[test]
    fn test_theta_join_needs_no_schema() {
        // Unvalidated children: a theta join never looks at schemas.
        let mut names = ViewNameGenerator::new();
        let node = theta_join("x = y", table(&mut names, "R"), table(&mut names, "S"), &mut names);
        assert!(gen_join(&std_ctx(), &node).is_ok());
    }

    #[test]
    fn test_natural_join_single_shared_column() {
        let sql = natural(
            &[("a", "INTEGER"), ("b", "INTEGER")],
            &[("b", "INTEGER"), ("c", "INTEGER")],
        );
        assert_eq!(
            sql,
            "SELECT V1.\"a\", V1.\"b\", V2.\"c\" FROM RA_TMP_VIEW_1 AS V1, RA_TMP_VIEW_2 AS V2 \
             WHERE V1.\"b\" = V2.\"b\""
        );
    }

    #[test]
    fn test_natural_join_no_shared_is_cross_product() {
        let sql = natural(&[("a", "INTEGER")], &[("c", "INTEGER")]);
        assert_eq!(sql, cross_product_sql("RA_TMP_VIEW_1", "RA_TMP_VIEW_2"));
    }

    #[test]
    fn test_natural_join_shared_in_right_order() {
        let sql = natural(
            &[("a", "INTEGER"), ("b", "INTEGER"), ("c", "INTEGER")],
            &[("c", "INTEGER"), ("d", "INTEGER"), ("b", "INTEGER")],
        );
        assert_sql_contains(&sql, r#"SELECT V1."a", V1."b", V1."c", V2."d" FROM"#);
        assert_sql_contains(&sql, r#"WHERE V1."c" = V2."c" AND V1."b" = V2."b""#);
    }

    #[test]
    fn test_natural_join_all_columns_shared() {
        let sql = natural(
            &[("a", "INTEGER"), ("b", "TEXT")],
            &[("b", "TEXT"), ("a", "INTEGER")],
        );
        assert_sql_contains(&sql, r#"SELECT V1."a", V1."b" FROM"#);
        assert_sql_not_contains(&sql, r#"V2."a","#);
        assert_sql_contains(&sql, r#"WHERE V1."b" = V2."b" AND V1."a" = V2."a""#);
    }

    #[test]
    fn test_natural_join_case_insensitive_names() {
        let sql = natural(
            &[("ID", "INTEGER"), ("x", "TEXT")],
            &[("id", "INTEGER"), ("y", "TEXT")],
        );
        assert_sql_contains(&sql, r#"SELECT V1."ID", V1."x", V2."y" FROM"#);
        assert_sql_contains(&sql, r#"WHERE V1."ID" = V2."id""#);
    }

    #[test]
    fn test_natural_join_quotes_engine_column_names() {
        // SQLite names the second `a` of a product `a:1`.
        let sql = natural(
            &[("a", "INTEGER"), ("b", "TEXT"), ("a:1", "INTEGER")],
            &[("b", "TEXT"), ("c", "INTEGER")],
        );
        assert_sql_contains(&sql, r#"SELECT V1."a", V1."b", V1."a:1", V2."c" FROM"#);
        assert_sql_not_contains(&sql, "V1.a:1");
    }

    #[test]
    fn test_natural_join_requires_validated_children() {
        let mut names = ViewNameGenerator::new();
        let node = join(table(&mut names, "R"), table(&mut names, "S"), &mut names);
        assert!(matches!(
            gen_join(&std_ctx(), &node),
            Err(RaError::InternalError(_))
        ));
    }

    #[test]
    fn test_shared_columns_pairs() {
        let l = schema_of("R", &[("a", "INTEGER"), ("B", "INTEGER")]);
        let r = schema_of("S", &[("b", "INTEGER"), ("a", "INTEGER"), ("z", "INTEGER")]);
        assert_eq!(shared_columns(&l, &r), vec![("B", "b"), ("a", "a")]);
    }

    #[test]
    fn test_gen_join_wrong_node() {
        let node = table(&mut ViewNameGenerator::new(), "R");
        assert!(gen_join(&std_ctx(), &node).is_err());
    }
}
