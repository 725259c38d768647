//! Top-level updates.
//!
//! ```text
//! MATCH (this:Movie)
//! WHERE <filter> AND <authorization> AND apoc.util.validatePredicate(<before rules>, ..)
//! SET this.title = $this_title, this.updatedAt = datetime()
//! <nested writes of this>
//! <checks of this>
//! RETURN collect(DISTINCT this { .. }) AS data
//! ```

use super::{
    DATA, META, columns,
    events::{EventKind, all_properties, collect_events, node_event, row_events},
    finish_node,
    write_args_parser::{WriteArgsParser, WriteMode},
};
use crate::{
    CompileResult,
    authorization::authorization_predicates,
    builder::{Compiled, resolve_entity},
    context::{Frame, Origin, Session, TraversalContext},
    extractors::{FilterTarget, extract_filter},
    input::InputMap,
    operation::UpdateOperation,
    read::{ProjectionOptions, ROOT, project},
    translate::{filter_predicate, node_pattern},
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, Entity, Filter, Narrowed, RelationField};

#[tracing::instrument(skip_all, fields(target = %op.target))]
pub(crate) fn update(session: &mut Session<'_>, op: &UpdateOperation) -> CompileResult<Compiled> {
    let entity = resolve_entity(session.schema, &op.target, "update")?;
    let node = Variable::new(ROOT);

    let filter = match &op.filter {
        Some(map) => extract_filter(session, map.clone(), &FilterTarget::from(entity.clone()))?,
        None => Filter::empty(),
    };

    let predicate = match filter.narrow_to(&entity) {
        Narrowed::Applies(filter) => filter_predicate(&filter, &node, Some(&entity)),
        Narrowed::Excluded => Predicate::Literal(false),
    };

    let auth = authorization_predicates(session, &entity, AuthorizationOperation::Update, &node)?;

    let mut statement = Statement::new().with(
        Match::new(node_pattern(&node, &entity))
            .so_that(predicate)
            .so_that(auth.where_predicate()),
    );

    let ctx = TraversalContext::root(Frame::new(entity.clone(), node.clone(), Origin::Update));
    let written = update_node(session, &ctx, op.update.clone(), auth.after_call(), &mut statement)?;

    let fields = op.selection.fields_for(entity.name());
    let projection = project(session, &node, &entity, &fields, &ProjectionOptions::default())?;
    let value = projection.push_into(&mut statement, &node);

    let mut ret = Return::new().item((Expression::distinct_function("collect", vec![value]), Variable::new(DATA)));

    if session.events() {
        ret = ret.item((collect_events(written.row_events(&node, &entity), &node), Variable::new(META)));
    }

    statement.push(ret);

    Ok(Compiled::new(statement, columns(session)))
}

/// What an update wrote, for its events.
pub(super) struct Written {
    /// `{node}_old`, the properties before the update, when the update sets any.
    pub(super) old: Option<Variable>,
    pub(super) nested_meta: Vec<Variable>,
}

impl Written {
    /// The update event, when properties changed, followed by the events of the nested writes.
    pub(super) fn row_events(&self, node: &Variable, entity: &Entity) -> Expression {
        let own = match &self.old {
            Some(old) => vec![node_event(EventKind::Update, node, entity, Expression::from(old), all_properties(node))],
            None => Vec::new(),
        };

        row_events(own, &self.nested_meta)
    }
}

/// Writes `data` to the matched node of `ctx`: properties, then relationship inputs, then the
/// cardinality checks of the relationships written and `after`.
pub(super) fn update_node(
    session: &mut Session<'_>,
    ctx: &TraversalContext,
    data: InputMap,
    after: Option<CallProcedure>,
    body: &mut Statement,
) -> CompileResult<Written> {
    let frame = ctx.node();
    let node = &frame.variable;
    let parser = WriteArgsParser::from(&frame.entity, data, WriteMode::Update)?;

    let old = (session.events() && !parser.args.is_empty()).then(|| node.child("old"));

    if let Some(old) = &old {
        body.push(With::star().item((all_properties(node), old.clone())));
    }

    if !parser.args.is_empty() {
        body.push(Set::new(parser.set_items(node)));
    }

    let checked: Vec<RelationField> = parser.nested.iter().map(|(field, _)| field.clone()).collect();
    let nested_meta = finish_node(session, ctx, parser.nested, checked, after, body)?;

    Ok(Written { old, nested_meta })
}
