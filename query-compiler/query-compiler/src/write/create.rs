//! Top-level creates: one subquery per input, then the projection of every created node.
//!
//! ```text
//! CALL {
//!     CREATE (this0:Movie)
//!     SET this0.title = $this0_title, this0.id = randomUUID()
//!     <nested writes of this0>
//!     <checks of this0>
//!     RETURN this0
//! }
//! CALL {
//!     CREATE (this1:Movie)
//!     ..
//!     RETURN this1
//! }
//! RETURN [this0 { .. }, this1 { .. }] AS data
//! ```

use super::{
    DATA, META, columns,
    events::{EventKind, all_properties, node_event, row_events},
    finish_node,
    write_args_parser::{WriteArgsParser, WriteMode},
};
use crate::{
    CompileResult,
    authorization::authorization_predicates,
    builder::{Compiled, resolve_entity},
    context::{Frame, Origin, Session, TraversalContext},
    input::{InputMap, InputValue},
    operation::CreateOperation,
    read::{ProjectionOptions, ROOT, project},
    translate::node_pattern,
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, FieldContainer, RelationField};

#[tracing::instrument(skip_all, fields(target = %op.target, inputs = op.input.len()))]
pub(crate) fn create(session: &mut Session<'_>, op: &CreateOperation) -> CompileResult<Compiled> {
    let entity = resolve_entity(session.schema, &op.target, "create")?;

    let mut statement = Statement::new();
    let mut nodes = Vec::with_capacity(op.input.len());
    let mut meta = Vec::new();

    for (index, data) in op.input.iter().enumerate() {
        let node = Variable::new(format!("{ROOT}{index}"));
        let ctx = TraversalContext::root(Frame::new(entity.clone(), node.clone(), Origin::Create));

        let mut body = Statement::new();
        let nested = create_clauses(&ctx, data.clone(), &mut body)?;
        let nested_meta = finish_created(session, &ctx, nested, &mut body)?;

        let mut ret = Return::new().item(&node);

        if session.events() {
            let event = node_event(EventKind::Create, &node, &entity, Expression::null(), all_properties(&node));
            let node_meta = node.child(META);

            ret = ret.item((row_events(vec![event], &nested_meta), node_meta.clone()));
            meta.push(node_meta);
        }

        body.push(ret);
        statement.push(Call::new(body));
        nodes.push(node);
    }

    let fields = op.selection.fields_for(entity.name());
    let mut values = Vec::with_capacity(nodes.len());

    for node in nodes.iter() {
        let projection = project(session, node, &entity, &fields, &ProjectionOptions::default())?;
        values.push(projection.push_into(&mut statement, node));
    }

    let mut ret = Return::new().item((Expression::list(values), Variable::new(DATA)));

    if session.events() {
        let events = meta
            .into_iter()
            .map(Expression::from)
            .reduce(|all, next| all.binary(BinaryOperator::Add, next))
            .unwrap_or_else(|| Expression::list(Vec::new()));

        ret = ret.item((events, Variable::new(META)));
    }

    statement.push(ret);

    Ok(Compiled::new(statement, columns(session)))
}

/// `CREATE (node:Label) SET ..` for the node of `ctx`. Returns the relationship inputs of `data`,
/// written once the node is in place.
pub(super) fn create_clauses(
    ctx: &TraversalContext,
    data: InputMap,
    body: &mut Statement,
) -> CompileResult<Vec<(RelationField, InputValue)>> {
    let frame = ctx.node();
    let parser = WriteArgsParser::from(&frame.entity, data, WriteMode::Create)?;

    body.push(Create::new(node_pattern(&frame.variable, &frame.entity)));

    if !parser.is_empty() {
        body.push(Set::new(parser.set_items(&frame.variable)));
    }

    Ok(parser.nested)
}

/// Nested writes and checks of a created node. Every constrained relationship is checked: the
/// node has no edges but the ones the program creates.
pub(super) fn finish_created(
    session: &mut Session<'_>,
    ctx: &TraversalContext,
    nested: Vec<(RelationField, InputValue)>,
    body: &mut Statement,
) -> CompileResult<Vec<Variable>> {
    let frame = ctx.node();
    let auth = authorization_predicates(session, &frame.entity, AuthorizationOperation::Create, &frame.variable)?;
    let checked = frame.entity.relation_fields();

    finish_node(session, ctx, nested, checked, auth.after_call(), body)
}
