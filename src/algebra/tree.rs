//! Algebra tree representation.
//!
//! An [`RaNode`] pairs an operator ([`RaOp`]) with the bookkeeping the
//! lifecycle needs: the temporary view standing in for the node's result,
//! the node's [`Status`], and the output schema cached once the view exists.
//!
//! Operator parameters (conditions, column lists) are kept verbatim from
//! the input; the database is what ultimately checks them.

use std::fmt::Write as _;

use crate::algebra::codegen::ViewNameGenerator;
use crate::db::TableSchema;
use crate::error::{DbError, RaError};
use crate::parser::Expr;

/// Validation state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not validated, or cleaned since. No view exists.
    Unchecked,
    /// The node's view exists and its schema is cached.
    Correct,
    /// Creating the node's view failed.
    Error,
}

/// A relational-algebra operator and its operands.
#[derive(Debug)]
pub enum RaOp {
    /// A base relation.
    Table { name: String },
    /// `\select_{condition}`.
    Select { condition: String, child: Box<RaNode> },
    /// `\project_{columns}`.
    Project { columns: String, child: Box<RaNode> },
    /// `\join` (natural, no condition) or `\join_{condition}` (theta).
    Join {
        condition: Option<String>,
        left: Box<RaNode>,
        right: Box<RaNode>,
    },
    /// `\cross`.
    Cross { left: Box<RaNode>, right: Box<RaNode> },
    /// `\union`.
    Union { left: Box<RaNode>, right: Box<RaNode> },
    /// `\diff`.
    Diff { left: Box<RaNode>, right: Box<RaNode> },
    /// `\intersect`.
    Intersect { left: Box<RaNode>, right: Box<RaNode> },
    /// `\rename_{columns}`: rename every column positionally.
    Rename { columns: String, child: Box<RaNode> },
}

/// A node of the algebra tree.
#[derive(Debug)]
pub struct RaNode {
    view_name: String,
    pub(crate) status: Status,
    pub(crate) schema: Option<TableSchema>,
    op: RaOp,
}

impl RaNode {
    /// Create a node, drawing its view name from `names`.
    ///
    /// Children must already be built, so leaves get the lowest numbers.
    pub fn new(op: RaOp, names: &mut ViewNameGenerator) -> Self {
        RaNode {
            view_name: names.next_name(),
            status: Status::Unchecked,
            schema: None,
            op,
        }
    }

    /// Translate a parsed expression one-to-one into an algebra tree.
    pub fn from_expr(expr: &Expr, names: &mut ViewNameGenerator) -> Self {
        fn unary(input: &Expr, names: &mut ViewNameGenerator) -> Box<RaNode> {
            Box::new(RaNode::from_expr(input, names))
        }

        let op = match expr {
            Expr::Relation(name) => RaOp::Table { name: name.clone() },
            Expr::Select { condition, input } => RaOp::Select {
                condition: condition.clone(),
                child: unary(input, names),
            },
            Expr::Project { columns, input } => RaOp::Project {
                columns: columns.clone(),
                child: unary(input, names),
            },
            Expr::Rename { columns, input } => RaOp::Rename {
                columns: columns.clone(),
                child: unary(input, names),
            },
            Expr::Join {
                condition,
                left,
                right,
            } => RaOp::Join {
                condition: condition.clone(),
                left: unary(left, names),
                right: unary(right, names),
            },
            Expr::Cross { left, right } => RaOp::Cross {
                left: unary(left, names),
                right: unary(right, names),
            },
            Expr::Union { left, right } => RaOp::Union {
                left: unary(left, names),
                right: unary(right, names),
            },
            Expr::Diff { left, right } => RaOp::Diff {
                left: unary(left, names),
                right: unary(right, names),
            },
            Expr::Intersect { left, right } => RaOp::Intersect {
                left: unary(left, names),
                right: unary(right, names),
            },
        };
        RaNode::new(op, names)
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Output schema; present only while the status is `Correct`.
    pub fn schema(&self) -> Option<&TableSchema> {
        self.schema.as_ref()
    }

    pub fn op(&self) -> &RaOp {
        &self.op
    }

    /// Children in operand order.
    pub fn children(&self) -> Vec<&RaNode> {
        match &self.op {
            RaOp::Table { .. } => vec![],
            RaOp::Select { child, .. }
            | RaOp::Project { child, .. }
            | RaOp::Rename { child, .. } => vec![&**child],
            RaOp::Join { left, right, .. }
            | RaOp::Cross { left, right }
            | RaOp::Union { left, right }
            | RaOp::Diff { left, right }
            | RaOp::Intersect { left, right } => vec![&**left, &**right],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut RaNode> {
        match &mut self.op {
            RaOp::Table { .. } => vec![],
            RaOp::Select { child, .. }
            | RaOp::Project { child, .. }
            | RaOp::Rename { child, .. } => vec![&mut **child],
            RaOp::Join { left, right, .. }
            | RaOp::Cross { left, right }
            | RaOp::Union { left, right }
            | RaOp::Diff { left, right }
            | RaOp::Intersect { left, right } => vec![&mut **left, &mut **right],
        }
    }

    /// Operator symbol plus its literal parameter, e.g. `\select_{a > 1}`.
    pub fn label(&self) -> String {
        match &self.op {
            RaOp::Table { name } => name.clone(),
            RaOp::Select { condition, .. } => format!("\\select_{{{condition}}}"),
            RaOp::Project { columns, .. } => format!("\\project_{{{columns}}}"),
            RaOp::Join {
                condition: Some(condition),
                ..
            } => format!("\\join_{{{condition}}}"),
            RaOp::Join {
                condition: None, ..
            } => "\\join".to_string(),
            RaOp::Cross { .. } => "\\cross".to_string(),
            RaOp::Union { .. } => "\\union".to_string(),
            RaOp::Diff { .. } => "\\diff".to_string(),
            RaOp::Intersect { .. } => "\\intersect".to_string(),
            RaOp::Rename { columns, .. } => format!("\\rename_{{{columns}}}"),
        }
    }

    /// Render the subtree, one node per line, children indented by four.
    ///
    /// In verbose mode validated nodes show their output schema and failed
    /// nodes carry an `<- ERROR!` marker.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        self.render_into(&mut out, verbose, 0);
        out
    }

    fn render_into(&self, out: &mut String, verbose: bool, indent: usize) {
        let _ = write!(out, "{:indent$}{}", "", self.label());
        if verbose {
            match (self.status, &self.schema) {
                (Status::Correct, Some(schema)) => {
                    let _ = write!(out, " <- output schema: {schema}");
                }
                (Status::Error, _) => out.push_str(" <- ERROR!"),
                _ => {}
            }
        }
        out.push('\n');
        for child in self.children() {
            child.render_into(out, verbose, indent + 4);
        }
    }

    /// Find the node backed by `view_name`.
    pub fn find(&self, view_name: &str) -> Option<&RaNode> {
        if self.view_name == view_name {
            return Some(self);
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find(view_name))
    }

    /// Visit every node, parent before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RaNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Build a validation error pointing at this node.
    pub(crate) fn validation_error(
        &self,
        reason: impl Into<String>,
        source: Option<DbError>,
    ) -> RaError {
        RaError::Validation {
            view: self.view_name.clone(),
            operator: self.label(),
            reason: reason.into(),
            source,
        }
    }
}
