//! Relational algebra evaluation engine.
//!
//! An expression is translated into an [`RaNode`] tree, each node of which
//! is realized as a temporary SQL view. The engine never evaluates an
//! operator itself; it only generates SQL and lets the database do the
//! work.
//!
//! # Architecture
//!
//! ```text
//! Expr (parser)
//!     │
//!     ▼
//! RaNode tree ──► validate (bottom-up, one CREATE VIEW per node)
//!     │                │
//!     │                ▼
//!     │          execute (SELECT * FROM root view)
//!     │                │
//!     └────────────────┴──► clean (DROP VIEW, always)
//! ```
//!
//! [`Session`] drives one statement through the whole cycle and owns the
//! view-name counter, which restarts for every statement.

pub mod codegen;
pub mod lifecycle;
pub mod operators;
pub mod tree;

pub use codegen::{CodegenContext, ViewNameGenerator};
pub use tree::{RaNode, RaOp, Status};

use crate::db::{CommandResult, Database, QueryResult};
use crate::error::{DbError, RaError};
use crate::parser::Expr;

/// Everything the shell reports about one evaluated expression.
#[derive(Debug)]
pub struct Evaluation {
    /// The tree as parsed, before validation.
    pub parsed_tree: String,
    /// The tree with output schemas, when validation succeeded.
    pub validated_tree: Option<String>,
    /// The failing subtree with the `<- ERROR!` marker, when validation
    /// failed.
    pub error_tree: Option<String>,
    /// Rows of the root view, or the validation/execution error.
    pub result: Result<QueryResult, RaError>,
    /// Views that could not be dropped afterwards.
    pub cleanup_errors: Vec<RaError>,
}

/// A connection plus the per-session evaluation state.
pub struct Session<D: Database> {
    db: D,
    names: ViewNameGenerator,
}

impl<D: Database> Session<D> {
    pub fn new(db: D) -> Self {
        Session {
            db,
            names: ViewNameGenerator::new(),
        }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut D {
        &mut self.db
    }

    /// Validate, execute, and clean up one expression.
    ///
    /// Clean-up runs whatever the outcome, so the database holds no
    /// temporary views once this returns (barring reported drop failures).
    pub fn evaluate(&mut self, expr: &Expr) -> Evaluation {
        self.names.reset();
        let mut tree = RaNode::from_expr(expr, &mut self.names);
        let parsed_tree = tree.render(false);
        log::info!(
            "evaluating expression with {} node(s)",
            self.names.issued()
        );

        let mut validated_tree = None;
        let mut error_tree = None;
        let result = match tree.validate(&mut self.db) {
            Ok(()) => {
                validated_tree = Some(tree.render(true));
                tree.execute(&mut self.db)
            }
            Err(e) => {
                log::info!("validation failed: {e}");
                let failing = match &e {
                    RaError::Validation { view, .. } => tree.find(view),
                    _ => None,
                };
                error_tree = Some(failing.unwrap_or(&tree).render(true));
                Err(e)
            }
        };

        let cleanup_errors = tree.clean(&mut self.db);
        if cleanup_errors.is_empty() {
            log::info!("evaluation finished, temporary views dropped");
        }

        Evaluation {
            parsed_tree,
            validated_tree,
            error_tree,
            result,
            cleanup_errors,
        }
    }

    /// Names of the relations visible in the database.
    pub fn list_relations(&mut self) -> Result<Vec<String>, DbError> {
        self.db.list_relations()
    }

    /// Pass raw SQL straight to the database.
    pub fn exec_commands(&mut self, sql: &str) -> Vec<Result<CommandResult, DbError>> {
        log::debug!("{sql}");
        self.db.exec_commands(sql)
    }
}
