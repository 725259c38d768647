//! # cypher-builder
//!
//! An AST for Cypher statements and a visitor rendering it into statement text plus a flat
//! parameter map.
//!
//! Values never end up in the text: every [`ast::Parameter`] is rendered as `$name` and its
//! value collected into the parameter map. While rendering, the visitor tracks the variables in
//! scope and refuses to produce statements reading unbound variables.
//!
//! ```rust
//! # use cypher_builder::{ast::*, visitor::{Cypher, Visitor}, Params};
//! let this = Variable::new("this");
//!
//! let mut statement = Statement::new();
//! statement.push(
//!     Match::new(Pattern::node(NodePattern::new(&this).label("Movie")))
//!         .so_that(this.property("title").equals(Expression::param("param0", "The Matrix"))),
//! );
//! statement.push(Return::new().item(&this));
//!
//! let (cypher, params) = Cypher::build(&statement, &Params::new()).unwrap();
//!
//! assert_eq!("MATCH (this:Movie)\nWHERE this.title = $param0\nRETURN this", cypher);
//! assert_eq!(1, params.len());
//! ```
pub mod ast;
mod error;
mod scope;
pub mod visitor;

pub use error::Error;
pub use scope::Scope;

use graph_value::GraphValue;
use indexmap::IndexMap;

/// Parameter values keyed by their name in the statement, in order of appearance.
pub type Params = IndexMap<String, GraphValue>;

pub type Result<T> = std::result::Result<T, Error>;
