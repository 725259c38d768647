//! An abstract syntax tree for Cypher statements.
//!
//! Statements are built from clauses in construction order, clauses from patterns, predicates
//! and expressions. Rendering and scope checking happen in the [visitor](crate::visitor).
mod clause;
mod expression;
mod pattern;
mod predicate;
mod projection;
mod statement;
mod variable;

pub use clause::*;
pub use expression::*;
pub use pattern::*;
pub use predicate::*;
pub use projection::*;
pub use statement::*;
pub use variable::*;
