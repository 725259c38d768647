//! Writes: creates, updates and deletes with their nested relationship writes.
//!
//! Every nested write is a subquery importing the node it starts from, so sibling writes run in
//! input order and each sees the effects of the previous ones:
//!
//! ```text
//! MATCH (this:Movie)
//! WHERE ..
//! SET this.title = $this_title
//! CALL {
//!     WITH this
//!     <connect to this.actors>
//! }
//! CALL {
//!     WITH this
//!     <create in this.genres>
//! }
//! CALL apoc.util.validate(<cardinality>, ..)
//! CALL apoc.util.validate(<after rules>, ..)
//! RETURN collect(DISTINCT this { .. }) AS data
//! ```
//!
//! Nested subqueries return nothing, or the list of their events when events are enabled.

mod create;
mod delete;
mod events;
mod nested;
mod update;
mod validation;
mod write_args_parser;

pub(crate) use create::create;
pub(crate) use delete::delete;
pub(crate) use update::update;

use crate::{
    CompileResult,
    context::{Session, TraversalContext},
    input::InputValue,
};
use cypher_builder::ast::*;
use events::collect_events;
use query_structure::RelationField;
use validation::cardinality_checks;

/// Column of the written data.
pub(crate) const DATA: &str = "data";

/// Column of the change events.
pub(crate) const META: &str = "meta";

pub(crate) fn columns(session: &Session<'_>) -> Vec<&'static str> {
    if session.events() { vec![DATA, META] } else { vec![DATA] }
}

/// Subqueries of the nested writes of one node, in input order.
#[derive(Debug, Default)]
pub(crate) struct Subqueries {
    calls: Vec<Call>,
}

impl Subqueries {
    pub(crate) fn push(&mut self, call: Call) {
        self.calls.push(call);
    }

    /// Pushes the subqueries into `statement`, returning the event lists they bind.
    pub(crate) fn push_into(self, statement: &mut Statement) -> Vec<Variable> {
        let mut meta = Vec::new();

        for call in self.calls {
            meta.extend(call.returns().into_iter().cloned());
            statement.push(call);
        }

        meta
    }
}

/// The clauses following the property writes of the node in `ctx`: its nested writes, the
/// cardinality checks of `checked` and the `after` authorization rules. Returns the event lists
/// of the nested writes.
pub(crate) fn finish_node(
    session: &mut Session<'_>,
    ctx: &TraversalContext,
    nested: Vec<(RelationField, InputValue)>,
    checked: Vec<RelationField>,
    after: Option<CallProcedure>,
    body: &mut Statement,
) -> CompileResult<Vec<Variable>> {
    let subqueries = nested::nested_writes(session, ctx, nested)?;
    let meta = subqueries.push_into(body);

    for check in cardinality_checks(session, &ctx.node().variable, checked) {
        body.push(check);
    }

    if let Some(after) = after {
        body.push(after);
    }

    Ok(meta)
}

/// Ends the body of a nested write: with events, `RETURN <events of all rows> AS {step}_meta`.
/// Without, the subquery returns nothing.
pub(crate) fn close_step(session: &Session<'_>, body: &mut Statement, step: &Variable, row: impl FnOnce() -> Expression) {
    if session.events() {
        body.push(Return::new().item((collect_events(row(), step), step.child(META))));
    }
}

/// Deletes the distinct nodes bound to `node` once every row is processed:
///
/// ```text
/// WITH collect(DISTINCT this) AS this_deleted
/// CALL {
///     WITH this_deleted
///     UNWIND this_deleted AS this
///     DETACH DELETE this
/// }
/// ```
///
/// `carried` columns are aggregated in the same `WITH`. Returns the list variable.
pub(crate) fn delete_collected(body: &mut Statement, node: &Variable, carried: Vec<(Expression, Variable)>) -> Variable {
    let deleted = node.child("deleted");
    let mut with = With::new().item((Expression::distinct_function("collect", vec![Expression::from(node)]), deleted.clone()));

    for item in carried {
        with = with.item(item);
    }

    body.push(with);

    let deletion = Statement::new()
        .with(Unwind::new(Expression::from(&deleted), node))
        .with(Delete::detach(node));

    body.push(Call::new(deletion).import(&deleted));

    deleted
}
