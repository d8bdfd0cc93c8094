//! SQLite backend.
//!
//! SQLite does not let a view declare its column names, so this backend
//! reports [`Dialect::Sqlite`] unless the configuration overrides it.

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, Statement};

use super::{Column, CommandResult, Database, QueryResult, Row, TableSchema};
use crate::dialect::Dialect;
use crate::error::DbError;

/// A single SQLite connection, file backed or in memory.
pub struct SqliteDatabase {
    conn: Connection,
    dialect: Dialect,
}

impl SqliteDatabase {
    /// Open a database file, or an in-memory database for `:memory:`.
    pub fn open(path: &str, dialect: Option<Dialect>) -> Result<Self, DbError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Ok(Self::from_connection(conn, dialect))
    }

    pub fn from_connection(conn: Connection, dialect: Option<Dialect>) -> Self {
        SqliteDatabase {
            conn,
            dialect: dialect.unwrap_or(Dialect::Sqlite),
        }
    }

    /// Direct access to the connection, for seeding data.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_view(&mut self, statement: &str) -> Result<(), DbError> {
        self.conn.execute_batch(statement)?;
        Ok(())
    }

    fn drop_view(&mut self, name: &str) -> Result<(), DbError> {
        self.conn.execute_batch(&format!("DROP VIEW {name}"))?;
        Ok(())
    }

    fn table_schema(&mut self, name: &str) -> Result<TableSchema, DbError> {
        let stmt = self.conn.prepare(&format!("SELECT * FROM {name}"))?;
        Ok(TableSchema::new(name, columns_of(&stmt)))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        collect_rows(&mut stmt)
    }

    fn list_relations(&mut self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>> {
        let mut results = Vec::new();
        let mut batch = Batch::new(&self.conn, sql);
        loop {
            let mut stmt = match batch.next() {
                Ok(Some(stmt)) => stmt,
                Ok(None) => break,
                Err(e) => {
                    results.push(Err(e.into()));
                    break;
                }
            };
            let result = if stmt.column_count() > 0 {
                collect_rows(&mut stmt).map(CommandResult::Rows)
            } else {
                stmt.execute([])
                    .map(|n| CommandResult::UpdateCount(n as u64))
                    .map_err(DbError::from)
            };
            let failed = result.is_err();
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }
}

fn columns_of(stmt: &Statement<'_>) -> Vec<Column> {
    stmt.columns()
        .iter()
        .map(|c| Column::new(c.name(), c.decl_type().unwrap_or("")))
        .collect()
}

fn collect_rows(stmt: &mut Statement<'_>) -> Result<QueryResult, DbError> {
    let columns = columns_of(stmt);
    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values: Row = Vec::with_capacity(width);
        for i in 0..width {
            values.push(render_value(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(QueryResult { columns, rows })
}

fn render_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(format!("<BLOB {} bytes>", b.len())),
    }
}
