//! PostgreSQL backend.
//!
//! DDL goes through `batch_execute`. Result rows are read with the simple
//! query protocol so every value arrives as text, which is all the shell
//! needs; column types come from preparing the same statement.

use postgres::{Client, NoTls, SimpleQueryMessage};

use super::{Column, CommandResult, Database, QueryResult, Row, TableSchema};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::DbError;

/// A single long-lived PostgreSQL connection.
pub struct PostgresDatabase {
    client: Client,
    /// Schema whose relations `list_relations` reports.
    schema: String,
    dialect: Dialect,
}

impl PostgresDatabase {
    /// Connect using a `postgres://` URL, applying user/password overrides
    /// from the configuration.
    pub fn connect(url: &str, config: &Config) -> Result<Self, DbError> {
        let mut pg_config: postgres::Config = url.parse()?;
        if let Some(user) = &config.user {
            pg_config.user(user.as_str());
        }
        if let Some(password) = &config.password {
            pg_config.password(password.as_str());
        }
        let client = pg_config.connect(NoTls)?;
        Ok(Self::from_client(client, config.schema(), config.dialect))
    }

    /// Wrap an already-connected client.
    pub fn from_client(client: Client, schema: &str, dialect: Option<Dialect>) -> Self {
        PostgresDatabase {
            client,
            schema: schema.to_string(),
            dialect: dialect.unwrap_or(Dialect::PostgreSql),
        }
    }

    fn columns_of(&mut self, sql: &str) -> Result<Vec<Column>, DbError> {
        let stmt = self.client.prepare(sql)?;
        Ok(stmt
            .columns()
            .iter()
            .map(|c| Column::new(c.name(), c.type_().name()))
            .collect())
    }
}

impl Database for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_view(&mut self, statement: &str) -> Result<(), DbError> {
        self.client.batch_execute(statement)?;
        Ok(())
    }

    fn drop_view(&mut self, name: &str) -> Result<(), DbError> {
        self.client.batch_execute(&format!("DROP VIEW {name}"))?;
        Ok(())
    }

    fn table_schema(&mut self, name: &str) -> Result<TableSchema, DbError> {
        let columns = self.columns_of(&format!("SELECT * FROM {name}"))?;
        Ok(TableSchema::new(name, columns))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        let columns = self.columns_of(sql)?;
        let mut rows = Vec::new();
        for message in self.client.simple_query(sql)? {
            if let SimpleQueryMessage::Row(row) = message {
                rows.push(text_row(&row));
            }
        }
        Ok(QueryResult { columns, rows })
    }

    fn list_relations(&mut self) -> Result<Vec<String>, DbError> {
        let rows = self.client.query(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 ORDER BY table_name",
            &[&self.schema],
        )?;
        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>> {
        // PostgreSQL runs a multi-statement batch as one implicit
        // transaction: any error aborts the lot, so there are no partial
        // results to report.
        let messages = match self.client.simple_query(sql) {
            Ok(messages) => messages,
            Err(e) => return vec![Err(e.into())],
        };

        let mut results = Vec::new();
        let mut current: Option<QueryResult> = None;
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(cols) => {
                    current = Some(QueryResult {
                        columns: cols.iter().map(|c| Column::new(c.name(), "")).collect(),
                        rows: Vec::new(),
                    });
                }
                SimpleQueryMessage::Row(row) => {
                    let table = current.get_or_insert_with(|| QueryResult {
                        columns: row
                            .columns()
                            .iter()
                            .map(|c| Column::new(c.name(), ""))
                            .collect(),
                        rows: Vec::new(),
                    });
                    table.rows.push(text_row(&row));
                }
                SimpleQueryMessage::CommandComplete(count) => match current.take() {
                    Some(table) => results.push(Ok(CommandResult::Rows(table))),
                    None => results.push(Ok(CommandResult::UpdateCount(count))),
                },
                _ => {}
            }
        }
        results
    }
}

fn text_row(row: &postgres::SimpleQueryRow) -> Row {
    (0..row.len())
        .map(|i| row.get(i).map(str::to_string))
        .collect()
}
