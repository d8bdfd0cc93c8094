//! SQL generation framework.
//!
//! Every algebra node is backed by one temporary view. [`CodegenContext`]
//! produces, for a node whose children already have views, the query that
//! defines the node's view and the complete `CREATE VIEW` statement. The
//! per-operator rules live in [`operators`](super::operators); this module
//! dispatches to them and holds the shared helpers.
//!
//! Generation is pure: schemas of children are read from the cache filled
//! in when their views were created, so no database access happens here.

use crate::algebra::operators;
use crate::algebra::tree::{RaNode, RaOp, Status};
use crate::db::TableSchema;
use crate::dialect::Dialect;
use crate::error::RaError;

/// Prefix of every generated temporary view name.
pub const VIEW_NAME_PREFIX: &str = "RA_TMP_VIEW_";

/// Source of unique temporary view names within one statement.
///
/// The session resets it before each statement, so names repeat across
/// statements but never within one.
#[derive(Debug, Default)]
pub struct ViewNameGenerator {
    counter: usize,
}

impl ViewNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused name: `RA_TMP_VIEW_1`, `RA_TMP_VIEW_2`, ...
    pub fn next_name(&mut self) -> String {
        self.counter += 1;
        format!("{VIEW_NAME_PREFIX}{}", self.counter)
    }

    /// Start numbering from 1 again.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Number of names handed out since the last reset.
    pub fn issued(&self) -> usize {
        self.counter
    }
}

/// Dialect-aware SQL generator.
#[derive(Debug, Clone, Copy)]
pub struct CodegenContext {
    pub dialect: Dialect,
}

impl CodegenContext {
    pub fn new(dialect: Dialect) -> Self {
        CodegenContext { dialect }
    }

    /// Query text that, if run, yields exactly the node's relation.
    pub fn view_definition(&self, node: &RaNode) -> Result<String, RaError> {
        match node.op() {
            RaOp::Table { .. } => operators::table::gen_table(self, node),
            RaOp::Select { .. } => operators::select::gen_select(self, node),
            RaOp::Project { .. } => operators::project::gen_project(self, node),
            RaOp::Join { .. } => operators::join::gen_join(self, node),
            RaOp::Cross { .. } => operators::cross::gen_cross(self, node),
            RaOp::Union { .. } => operators::union::gen_union(self, node),
            RaOp::Diff { .. } => operators::except::gen_except(self, node),
            RaOp::Intersect { .. } => operators::intersect::gen_intersect(self, node),
            RaOp::Rename { .. } => operators::rename::gen_rename(self, node),
        }
    }

    /// Complete statement creating the node's view.
    ///
    /// Identical to `CREATE VIEW <name> AS <definition>` for every operator
    /// except renaming, which may declare the view's column list.
    pub fn create_view_statement(&self, node: &RaNode) -> Result<String, RaError> {
        match node.op() {
            RaOp::Rename { .. } => operators::rename::gen_rename_create(self, node),
            _ => Ok(format!(
                "CREATE VIEW {} AS {}",
                node.view_name(),
                self.view_definition(node)?
            )),
        }
    }
}

/// Schema of an already-validated child.
pub(crate) fn child_schema(child: &RaNode) -> Result<&TableSchema, RaError> {
    match (child.status(), child.schema()) {
        (Status::Correct, Some(schema)) => Ok(schema),
        _ => Err(RaError::InternalError(format!(
            "schema of {} requested before it was validated",
            child.view_name()
        ))),
    }
}

/// Split a comma-separated column list, trimming each name.
pub fn split_column_list(columns: &str) -> Vec<String> {
    columns.split(',').map(|c| c.trim().to_string()).collect()
}

/// Quote a column name as reported by the engine.
///
/// Engines may report names that are not valid bare identifiers: SQLite
/// calls a duplicate `a` in a product `a:1`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build a comma-separated list of `prefix."column"` references.
pub fn qualified_col_list<S: AsRef<str>>(prefix: &str, cols: &[S]) -> String {
    cols.iter()
        .map(|c| format!("{prefix}.{}", quote_ident(c.as_ref())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build `l."c1" = r."d1" AND l."c2" = r."d2" ...` from paired column names.
pub fn equality_conjunction<S: AsRef<str>>(
    left_prefix: &str,
    right_prefix: &str,
    pairs: &[(S, S)],
) -> String {
    pairs
        .iter()
        .map(|(l, r)| {
            format!(
                "{left_prefix}.{} = {right_prefix}.{}",
                quote_ident(l.as_ref()),
                quote_ident(r.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
