//! Database collaborators.
//!
//! The algebra engine never evaluates relational operators itself; it talks
//! to a live SQL engine through the [`Database`] trait. Two backends are
//! provided:
//!
//! - [`pg`]: PostgreSQL through the synchronous `postgres` client.
//! - [`sqlite`]: SQLite through `rusqlite`.
//!
//! Every call is blocking and the engine is authoritative for error
//! detection: malformed generated SQL is only caught when the engine rejects
//! it.

pub mod pg;
pub mod sqlite;

use std::fmt;

use crate::config::{Backend, Config};
use crate::dialect::Dialect;
use crate::error::{DbError, RaError};

pub use self::pg::PostgresDatabase;
pub use self::sqlite::SqliteDatabase;

/// A single output column: name and engine-reported type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_name: String,
}

impl Column {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Ordered output schema of a relation or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Relation (or view) the schema was read from.
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        TableSchema {
            name: name.into(),
            columns,
        }
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for TableSchema {
    /// Renders as `name(col type, col type, ...)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_columns(f, &self.columns)?;
        write!(f, ")")
    }
}

/// Writes `col type, col type, ...`.
pub(crate) fn write_columns(f: &mut impl fmt::Write, columns: &[Column]) -> fmt::Result {
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", col.name, col.type_name)?;
    }
    Ok(())
}

/// A row of text-rendered values; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// The schema and rows returned by a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Outcome of one statement inside a raw SQL batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The statement produced a table.
    Rows(QueryResult),
    /// The statement modified rows (or was DDL, reporting zero).
    UpdateCount(u64),
}

/// Contract between the algebra engine and a SQL engine.
pub trait Database {
    /// Capability tag selecting the code generation quirks.
    fn dialect(&self) -> Dialect;

    /// Issue a complete `CREATE VIEW` statement.
    fn create_view(&mut self, statement: &str) -> Result<(), DbError>;

    /// Drop the named view.
    fn drop_view(&mut self, name: &str) -> Result<(), DbError>;

    /// Ordered output schema of a table or view.
    fn table_schema(&mut self, name: &str) -> Result<TableSchema, DbError>;

    /// Run a query and collect its schema and rows.
    fn query(&mut self, sql: &str) -> Result<QueryResult, DbError>;

    /// Names of the base tables and views visible to the session.
    fn list_relations(&mut self) -> Result<Vec<String>, DbError>;

    /// Execute a batch of raw SQL statements.
    ///
    /// Results are reported in order. An `Err` entry is always the last
    /// one: the batch stops at the first failing statement.
    fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>>;
}

impl<D: Database + ?Sized> Database for Box<D> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn create_view(&mut self, statement: &str) -> Result<(), DbError> {
        (**self).create_view(statement)
    }

    fn drop_view(&mut self, name: &str) -> Result<(), DbError> {
        (**self).drop_view(name)
    }

    fn table_schema(&mut self, name: &str) -> Result<TableSchema, DbError> {
        (**self).table_schema(name)
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        (**self).query(sql)
    }

    fn list_relations(&mut self) -> Result<Vec<String>, DbError> {
        (**self).list_relations()
    }

    fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>> {
        (**self).exec_commands(sql)
    }
}

/// Open the backend named by the configuration.
pub fn connect(config: &Config) -> Result<Box<dyn Database>, RaError> {
    let db: Box<dyn Database> = match config.backend()? {
        Backend::Postgres(url) => Box::new(PostgresDatabase::connect(&url, config)?),
        Backend::Sqlite(path) => Box::new(SqliteDatabase::open(&path, config.dialect)?),
    };
    log::info!("connected ({} dialect)", db.dialect());
    Ok(db)
}
