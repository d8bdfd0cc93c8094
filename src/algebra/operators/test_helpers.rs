//! Shared test helpers for algebra unit tests.
//!
//! Provides tree builders, schema fixtures, a recording [`MockDatabase`],
//! and assertion helpers. All helpers are `#[cfg(test)]` and never touch a
//! real database.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::algebra::codegen::{CodegenContext, ViewNameGenerator};
use crate::algebra::tree::{RaNode, RaOp, Status};
use crate::db::{Column, CommandResult, Database, QueryResult, Row, TableSchema};
use crate::dialect::Dialect;
use crate::error::DbError;

// ── Context ─────────────────────────────────────────────────────────────

/// Code generator for a dialect with native set operators and view column
/// lists.
pub fn std_ctx() -> CodegenContext {
    CodegenContext::new(Dialect::PostgreSql)
}

// ── Schema fixtures ─────────────────────────────────────────────────────

pub fn schema_of(name: &str, cols: &[(&str, &str)]) -> TableSchema {
    TableSchema::new(
        name,
        cols.iter().map(|(n, t)| Column::new(*n, *t)).collect(),
    )
}

/// Mark a node validated with the given output columns, as if its view had
/// been created.
pub fn mark_correct(node: &mut RaNode, cols: &[(&str, &str)]) {
    node.status = Status::Correct;
    node.schema = Some(schema_of(node.view_name(), cols));
}

// ── Tree builders ───────────────────────────────────────────────────────

pub fn table(names: &mut ViewNameGenerator, name: &str) -> RaNode {
    RaNode::new(RaOp::Table { name: name.into() }, names)
}

/// Base relation already validated with the given columns.
pub fn validated_table(names: &mut ViewNameGenerator, name: &str, cols: &[(&str, &str)]) -> RaNode {
    let mut node = table(names, name);
    mark_correct(&mut node, cols);
    node
}

pub fn select(condition: &str, child: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Select {
            condition: condition.into(),
            child: Box::new(child),
        },
        names,
    )
}

pub fn project(columns: &str, child: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Project {
            columns: columns.into(),
            child: Box::new(child),
        },
        names,
    )
}

pub fn rename(columns: &str, child: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Rename {
            columns: columns.into(),
            child: Box::new(child),
        },
        names,
    )
}

/// Natural join.
pub fn join(left: RaNode, right: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Join {
            condition: None,
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

pub fn theta_join(
    condition: &str,
    left: RaNode,
    right: RaNode,
    names: &mut ViewNameGenerator,
) -> RaNode {
    RaNode::new(
        RaOp::Join {
            condition: Some(condition.into()),
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

pub fn cross(left: RaNode, right: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Cross {
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

pub fn union(left: RaNode, right: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Union {
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

pub fn diff(left: RaNode, right: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Diff {
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

pub fn intersect(left: RaNode, right: RaNode, names: &mut ViewNameGenerator) -> RaNode {
    RaNode::new(
        RaOp::Intersect {
            left: Box::new(left),
            right: Box::new(right),
        },
        names,
    )
}

/// Collect every node's status, parent first.
pub fn statuses(node: &RaNode) -> Vec<Status> {
    let mut out = Vec::new();
    node.walk(&mut |n| out.push(n.status()));
    out
}

// ── Mock database ───────────────────────────────────────────────────────

/// In-memory stand-in for a SQL engine.
///
/// Records every statement it receives and tracks which views exist. A
/// created view reports the schema registered for its name in
/// `view_schemas`, or a single `c INTEGER` column otherwise.
#[derive(Debug)]
pub struct MockDatabase {
    pub dialect: Dialect,
    /// Every statement issued, in order (DDL, queries, raw batches).
    pub log: Vec<String>,
    /// Base tables known to the engine.
    pub tables: BTreeMap<String, TableSchema>,
    /// Schema reported for a view once created, keyed by view name.
    pub view_schemas: HashMap<String, TableSchema>,
    /// Views currently present.
    pub live_views: BTreeSet<String>,
    /// `create_view` fails for statements containing any of these.
    pub fail_create_containing: Vec<String>,
    /// `drop_view` fails for these view names, leaving the view in place.
    pub fail_drop: BTreeSet<String>,
    /// `table_schema` fails for these names.
    pub fail_schema: BTreeSet<String>,
    pub fail_query: bool,
    /// Rows returned by `query`.
    pub rows: Vec<Row>,
}

impl MockDatabase {
    pub fn new(dialect: Dialect) -> Self {
        MockDatabase {
            dialect,
            log: Vec::new(),
            tables: BTreeMap::new(),
            view_schemas: HashMap::new(),
            live_views: BTreeSet::new(),
            fail_create_containing: Vec::new(),
            fail_drop: BTreeSet::new(),
            fail_schema: BTreeSet::new(),
            fail_query: false,
            rows: Vec::new(),
        }
    }

    pub fn with_view_schema(mut self, view: &str, cols: &[(&str, &str)]) -> Self {
        self.view_schemas
            .insert(view.to_string(), schema_of(view, cols));
        self
    }

    pub fn with_table(mut self, name: &str, cols: &[(&str, &str)]) -> Self {
        self.tables.insert(name.to_string(), schema_of(name, cols));
        self
    }

    pub fn failing_create(mut self, fragment: &str) -> Self {
        self.fail_create_containing.push(fragment.to_string());
        self
    }

    /// Statements starting with `prefix`.
    pub fn statements(&self, prefix: &str) -> Vec<&str> {
        self.log
            .iter()
            .filter(|s| s.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn view_name_of(statement: &str) -> Option<&str> {
        let rest = statement.strip_prefix("CREATE VIEW ")?;
        let end = rest
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

impl Database for MockDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_view(&mut self, statement: &str) -> Result<(), DbError> {
        self.log.push(statement.to_string());
        if let Some(fragment) = self
            .fail_create_containing
            .iter()
            .find(|f| statement.contains(f.as_str()))
        {
            return Err(DbError::Message(format!("syntax error near \"{fragment}\"")));
        }
        let name = Self::view_name_of(statement)
            .ok_or_else(|| DbError::Message(format!("not a CREATE VIEW: {statement}")))?
            .to_string();
        if !self.live_views.insert(name.clone()) {
            return Err(DbError::Message(format!("view {name} already exists")));
        }
        Ok(())
    }

    fn drop_view(&mut self, name: &str) -> Result<(), DbError> {
        self.log.push(format!("DROP VIEW {name}"));
        if self.fail_drop.contains(name) {
            return Err(DbError::Message(format!("cannot drop view {name}")));
        }
        if !self.live_views.remove(name) {
            return Err(DbError::Message(format!("no such view: {name}")));
        }
        Ok(())
    }

    fn table_schema(&mut self, name: &str) -> Result<TableSchema, DbError> {
        if self.fail_schema.contains(name) {
            return Err(DbError::Message(format!("cannot describe {name}")));
        }
        if let Some(schema) = self.tables.get(name) {
            return Ok(schema.clone());
        }
        if !self.live_views.contains(name) {
            return Err(DbError::Message(format!("no such table: {name}")));
        }
        Ok(self
            .view_schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| schema_of(name, &[("c", "INTEGER")])))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        self.log.push(sql.to_string());
        if self.fail_query {
            return Err(DbError::Message("division by zero".into()));
        }
        let columns = sql
            .strip_prefix("SELECT * FROM ")
            .and_then(|name| self.table_schema(name).ok())
            .map(|s| s.columns)
            .unwrap_or_default();
        Ok(QueryResult {
            columns,
            rows: self.rows.clone(),
        })
    }

    fn list_relations(&mut self) -> Result<Vec<String>, DbError> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.extend(self.live_views.iter().cloned());
        Ok(names)
    }

    fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>> {
        self.log.push(sql.to_string());
        vec![Ok(CommandResult::UpdateCount(0))]
    }
}

// ── Assertion helpers ───────────────────────────────────────────────────

/// Assert that the generated SQL contains a substring (case-sensitive).
pub fn assert_sql_contains(sql: &str, expected: &str) {
    assert!(
        sql.contains(expected),
        "Expected SQL to contain:\n  {expected}\nGot:\n  {sql}",
    );
}

/// Assert that the generated SQL does NOT contain a substring (case-sensitive).
pub fn assert_sql_not_contains(sql: &str, unexpected: &str) {
    assert!(
        !sql.contains(unexpected),
        "Expected SQL NOT to contain:\n  {unexpected}\nGot:\n  {sql}",
    );
}
