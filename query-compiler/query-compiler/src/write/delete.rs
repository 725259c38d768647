//! Top-level deletes. Nested deletes run first, the matched nodes are deleted once every row is
//! processed:
//!
//! ```text
//! MATCH (this:Movie)
//! WHERE ..
//! CALL {
//!     WITH this
//!     <delete this.actors>
//! }
//! WITH collect(DISTINCT this) AS this_deleted
//! CALL {
//!     WITH this_deleted
//!     UNWIND this_deleted AS this
//!     DETACH DELETE this
//! }
//! RETURN size(this_deleted) AS data
//! ```

use super::{
    DATA, META, columns, delete_collected,
    events::{EventKind, all_properties, collect_events, node_event, row_events},
    nested::{nested_writes, relation_inputs},
};
use crate::{
    CompileResult,
    authorization::authorization_predicates,
    builder::{Compiled, resolve_entity},
    context::{Frame, Origin, Session, TraversalContext},
    extractors::{FilterTarget, extract_filter},
    operation::DeleteOperation,
    read::ROOT,
    translate::{filter_predicate, node_pattern},
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, Filter, Narrowed};

#[tracing::instrument(skip_all, fields(target = %op.target))]
pub(crate) fn delete(session: &mut Session<'_>, op: &DeleteOperation) -> CompileResult<Compiled> {
    let entity = resolve_entity(session.schema, &op.target, "delete")?;
    let node = Variable::new(ROOT);

    let filter = match &op.filter {
        Some(map) => extract_filter(session, map.clone(), &FilterTarget::from(entity.clone()))?,
        None => Filter::empty(),
    };

    let predicate = match filter.narrow_to(&entity) {
        Narrowed::Applies(filter) => filter_predicate(&filter, &node, Some(&entity)),
        Narrowed::Excluded => Predicate::Literal(false),
    };

    let auth = authorization_predicates(session, &entity, AuthorizationOperation::Delete, &node)?;

    let mut statement = Statement::new().with(
        Match::new(node_pattern(&node, &entity))
            .so_that(predicate)
            .so_that(auth.where_predicate()),
    );

    let ctx = TraversalContext::root(Frame::new(entity.clone(), node.clone(), Origin::Delete));
    let nested = relation_inputs(&entity, op.delete.clone(), "delete")?;
    let nested_meta = nested_writes(session, &ctx, nested)?.push_into(&mut statement);

    let mut carried = Vec::new();

    if session.events() {
        let event = node_event(EventKind::Delete, &node, &entity, all_properties(&node), Expression::null());
        carried.push((collect_events(row_events(vec![event], &nested_meta), &node), Variable::new(META)));
    }

    let deleted = delete_collected(&mut statement, &node, carried);

    let mut ret = Return::new().item((Expression::function("size", vec![Expression::from(&deleted)]), Variable::new(DATA)));

    if session.events() {
        ret = ret.item(Variable::new(META));
    }

    statement.push(ret);

    Ok(Compiled::new(statement, columns(session)))
}
