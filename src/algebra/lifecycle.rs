//! Validate / execute / clean state machine.
//!
//! ```text
//! Unchecked --validate ok--> Correct --clean--> Unchecked
//! Unchecked --validate fail--> Error --clean--> Unchecked
//! ```
//!
//! Validation walks the tree bottom-up, creating one view per node. A node
//! is only attempted once all its children are `Correct`; the first failure
//! stops the walk. Execution queries the root view. Cleaning drops every
//! view that was created and resets every status, whatever happened before.

use crate::algebra::codegen::CodegenContext;
use crate::algebra::tree::{RaNode, Status};
use crate::db::{Database, QueryResult};
use crate::error::RaError;

impl RaNode {
    /// Validate the subtree rooted at this node.
    ///
    /// On success every node of the subtree is `Correct` and has a view. On
    /// failure the failing node is `Error`, nodes validated before it are
    /// `Correct`, and the rest are untouched; call [`RaNode::clean`] either
    /// way.
    pub fn validate<D: Database + ?Sized>(&mut self, db: &mut D) -> Result<(), RaError> {
        for child in self.children_mut() {
            child.validate(db)?;
        }

        // A view left over from an earlier, interrupted session may hold
        // this name. This cannot succeed when another stale view depends on
        // it; creation will then fail below.
        if let Err(e) = db.drop_view(self.view_name()) {
            log::debug!("no stale view {} to drop: {e}", self.view_name());
        }

        let ctx = CodegenContext::new(db.dialect());
        let statement = match ctx.create_view_statement(self) {
            Ok(statement) => statement,
            Err(e) => {
                self.status = Status::Error;
                return Err(e);
            }
        };

        log::debug!("{statement}");
        if let Err(e) = db.create_view(&statement) {
            self.status = Status::Error;
            return Err(self.validation_error(e.to_string(), Some(e)));
        }

        match db.table_schema(self.view_name()) {
            Ok(schema) => {
                self.schema = Some(schema);
                self.status = Status::Correct;
                Ok(())
            }
            Err(e) => {
                self.status = Status::Error;
                // Not Correct, so clean will not drop it.
                if let Err(drop_err) = db.drop_view(self.view_name()) {
                    log::warn!("error dropping view {}: {drop_err}", self.view_name());
                }
                Err(self.validation_error(
                    format!("cannot read schema of created view: {e}"),
                    Some(e),
                ))
            }
        }
    }

    /// Query the validated root view.
    pub fn execute<D: Database + ?Sized>(&self, db: &mut D) -> Result<QueryResult, RaError> {
        if self.status != Status::Correct {
            return Err(RaError::InternalError(format!(
                "execute called on {} while {:?}",
                self.view_name(),
                self.status
            )));
        }
        let sql = format!("SELECT * FROM {}", self.view_name());
        log::debug!("{sql}");
        db.query(&sql).map_err(RaError::Execution)
    }

    /// Drop every view created for the subtree and reset all statuses.
    ///
    /// Parents are dropped before their children, since a parent's view
    /// depends on its children's. A failed drop is returned and the walk
    /// continues. Calling this again is a no-op.
    pub fn clean<D: Database + ?Sized>(&mut self, db: &mut D) -> Vec<RaError> {
        let mut errors = Vec::new();
        self.clean_into(db, &mut errors);
        errors
    }

    fn clean_into<D: Database + ?Sized>(&mut self, db: &mut D, errors: &mut Vec<RaError>) {
        if self.status == Status::Correct {
            log::debug!("DROP VIEW {}", self.view_name());
            if let Err(source) = db.drop_view(self.view_name()) {
                log::warn!("error dropping view {}: {source}", self.view_name());
                errors.push(RaError::Cleanup {
                    view: self.view_name().to_string(),
                    source,
                });
            }
        }
        self.status = Status::Unchecked;
        self.schema = None;
        for child in self.children_mut() {
            child.clean_into(db, errors);
        }
    }
}
