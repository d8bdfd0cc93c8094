//! ra_views: relational algebra over live SQL views.
//!
//! A user types relational algebra expressions (selection, projection,
//! joins, set operations, renaming) and has them evaluated against a real
//! PostgreSQL or SQLite database. Nothing is evaluated in memory: every node
//! of the expression tree becomes a temporary view whose definition is
//! generated from the node's operator and its children's views, so the
//! database both checks and computes the whole expression.
//!
//! # Modules
//!
//! - [`parser`]: textual syntax (`\select_{cond} R \join S;`).
//! - [`algebra`]: the tree, per-dialect SQL generation, and the
//!   validate / execute / clean lifecycle.
//! - [`db`]: the database contract and its PostgreSQL and SQLite backends.
//! - [`dialect`]: SQL capability tags driving code generation.
//! - [`config`]: TOML connection settings.
//! - [`shell`]: the interactive read-evaluate-print loop.
//! - [`error`]: the crate error type.

pub mod algebra;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod shell;

pub use algebra::{Evaluation, Session};
pub use error::{RaError, RaErrorKind};
