//! SQL dialect capability tags.
//!
//! Code generation is dialect independent except at two points: renaming
//! (engines that cannot declare a view's column list) and difference /
//! intersection (engines without `EXCEPT` / `INTERSECT`). A [`Dialect`] is
//! reported by the database collaborator, or forced through configuration.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::RaError;

/// The SQL engine a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "postgres")]
    PostgreSql,
    Sqlite,
    MySql,
    Db2,
}

impl Dialect {
    /// Whether `CREATE VIEW name(c1, ...) AS ...` is accepted.
    pub fn supports_view_column_list(self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// Whether `EXCEPT` and `INTERSECT` are available.
    pub fn supports_except_intersect(self) -> bool {
        !matches!(self, Dialect::MySql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::PostgreSql => write!(f, "postgresql"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Db2 => write!(f, "db2"),
        }
    }
}

impl FromStr for Dialect {
    type Err = RaError;

    fn from_str(s: &str) -> Result<Dialect, RaError> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Dialect::PostgreSql),
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            "db2" => Ok(Dialect::Db2),
            other => Err(RaError::InvalidArgument(format!("unknown dialect: {other}"))),
        }
    }
}
