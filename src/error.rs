//! Error types for ra_views.
//!
//! All errors that can occur while evaluating a statement are represented by
//! [`RaError`]. Errors are propagated via `Result<T, RaError>` throughout the
//! codebase and rendered for the user by the shell.
//!
//! # Error Classification
//!
//! Errors are classified into categories that determine how the shell
//! reports them and whether the session survives:
//! - **User**: input that does not parse, bad arguments. Rest of the
//!   statement is skipped.
//! - **Validation**: a node's generated SQL was rejected by the database,
//!   or a dialect precondition failed. The tree is printed with an error
//!   marker at the failing node.
//! - **Execution**: the root view validated but the final query failed.
//! - **Cleanup**: a temporary view could not be dropped. Reported only.
//! - **System**: configuration, connection, and I/O failures.
//! - **Internal**: bugs.
//!
//! Only I/O failures on the input stream are fatal; see
//! [`RaError::is_fatal`].

use std::fmt;

/// Error reported by a database collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An error from the PostgreSQL client.
    #[error("{0}")]
    Postgres(#[from] postgres::Error),

    /// An error from the SQLite engine.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error described only by its message.
    #[error("{0}")]
    Message(String),
}

impl DbError {
    /// Vendor error code, when the engine reports one.
    pub fn code(&self) -> Option<i32> {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => Some(err.extended_code),
            _ => None,
        }
    }

    /// Five-character SQLSTATE, when the engine reports one.
    pub fn sql_state(&self) -> Option<String> {
        match self {
            DbError::Postgres(err) => err.code().map(|state| state.code().to_string()),
            _ => None,
        }
    }

    /// Multi-line description in the shell's diagnostic format.
    pub fn details(&self) -> String {
        let mut out = format!("Error message: {self}");
        if let Some(code) = self.code() {
            out.push_str(&format!("\nError code: {code}"));
        }
        if let Some(state) = self.sql_state() {
            out.push_str(&format!("\nSQL state: {state}"));
        }
        out
    }
}

/// Primary error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum RaError {
    // ── User errors: skip the statement ──────────────────────────────────
    /// The statement text could not be parsed.
    #[error("parse error at offset {offset}: {message}")]
    ParseError { offset: usize, message: String },

    /// An invalid argument was provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // ── Statement errors: report and continue ─────────────────────────────
    /// A node failed validation.
    ///
    /// `view` and `operator` identify the failing node; `source` holds the
    /// database error when the failure came from the engine rather than a
    /// dialect precondition.
    #[error("error validating {operator} ({view}): {reason}")]
    Validation {
        view: String,
        operator: String,
        reason: String,
        #[source]
        source: Option<DbError>,
    },

    /// The root view validated but querying it failed.
    #[error("error executing validated query: {0}")]
    Execution(#[source] DbError),

    /// A temporary view could not be dropped during clean-up.
    #[error("error dropping view {view}: {source}")]
    Cleanup {
        view: String,
        #[source]
        source: DbError,
    },

    // ── System errors ────────────────────────────────────────────────────
    /// A database call outside the validate/execute/clean cycle failed.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Internal errors ─────────────────────────────────────────────────
    /// An unexpected internal error. Indicates a bug.
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Classification of errors for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaErrorKind {
    User,
    Validation,
    Execution,
    Cleanup,
    System,
    Internal,
}

impl fmt::Display for RaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaErrorKind::User => write!(f, "USER"),
            RaErrorKind::Validation => write!(f, "VALIDATION"),
            RaErrorKind::Execution => write!(f, "EXECUTION"),
            RaErrorKind::Cleanup => write!(f, "CLEANUP"),
            RaErrorKind::System => write!(f, "SYSTEM"),
            RaErrorKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl RaError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> RaErrorKind {
        match self {
            RaError::ParseError { .. } | RaError::InvalidArgument(_) => RaErrorKind::User,
            RaError::Validation { .. } => RaErrorKind::Validation,
            RaError::Execution(_) => RaErrorKind::Execution,
            RaError::Cleanup { .. } => RaErrorKind::Cleanup,
            RaError::Database(_) | RaError::Config(_) | RaError::Io(_) => RaErrorKind::System,
            RaError::InternalError(_) => RaErrorKind::Internal,
        }
    }

    /// Whether the error should end the session.
    ///
    /// Everything except an I/O failure leaves the session able to accept
    /// the next statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RaError::Io(_))
    }

    /// The underlying database error, if any.
    pub fn db_error(&self) -> Option<&DbError> {
        match self {
            RaError::Validation { source, .. } => source.as_ref(),
            RaError::Execution(err) | RaError::Cleanup { source: err, .. } => Some(err),
            RaError::Database(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(source: Option<DbError>) -> RaError {
        RaError::Validation {
            view: "RA_TMP_VIEW_3".into(),
            operator: "\\rename_{x, y}".into(),
            reason: "renaming an incorrect number of columns".into(),
            source,
        }
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            RaError::ParseError {
                offset: 0,
                message: "x".into()
            }
            .kind(),
            RaErrorKind::User
        );
        assert_eq!(validation(None).kind(), RaErrorKind::Validation);
        assert_eq!(
            RaError::Execution(DbError::Message("x".into())).kind(),
            RaErrorKind::Execution
        );
        assert_eq!(
            RaError::Cleanup {
                view: "v".into(),
                source: DbError::Message("x".into())
            }
            .kind(),
            RaErrorKind::Cleanup
        );
        assert_eq!(RaError::Config("x".into()).kind(), RaErrorKind::System);
        assert_eq!(
            RaError::InternalError("x".into()).kind(),
            RaErrorKind::Internal
        );
    }

    #[test]
    fn test_only_io_is_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed");
        assert!(RaError::Io(io).is_fatal());
        assert!(!validation(None).is_fatal());
        assert!(!RaError::Execution(DbError::Message("x".into())).is_fatal());
        assert!(!RaError::Database(DbError::Message("x".into())).is_fatal());
    }

    #[test]
    fn test_validation_message_names_node() {
        let msg = validation(None).to_string();
        assert!(msg.contains("RA_TMP_VIEW_3"));
        assert!(msg.contains("\\rename_{x, y}"));
        assert!(msg.contains("incorrect number of columns"));
    }

    #[test]
    fn test_db_error_exposed() {
        let err = validation(Some(DbError::Message("no such table: R".into())));
        assert_eq!(err.db_error().unwrap().to_string(), "no such table: R");
        assert!(validation(None).db_error().is_none());
        assert!(RaError::Config("x".into()).db_error().is_none());
    }

    #[test]
    fn test_db_error_details_message_only() {
        let err = DbError::Message("boom".into());
        assert_eq!(err.details(), "Error message: boom");
        assert!(err.code().is_none());
        assert!(err.sql_state().is_none());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(RaErrorKind::Validation.to_string(), "VALIDATION");
        assert_eq!(RaErrorKind::System.to_string(), "SYSTEM");
    }
}
