//! Per-operator SQL generation rules.
//!
//! Each operator kind has one function producing the query that defines
//! the node's view from its children's views. Dialect-dependent rules
//! (renaming without a view column list, difference and intersection
//! without native set operators) live next to the standard rule for the
//! same operator.

pub mod cross;
pub mod except;
pub mod intersect;
pub mod join;
pub mod project;
pub mod rename;
pub mod select;
pub mod set_common;
pub mod table;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod union;
