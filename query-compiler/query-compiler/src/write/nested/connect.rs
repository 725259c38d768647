use super::{Step, check_keys, edge_args, relation_inputs};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    context::{Frame, Origin, Session},
    extractors::{FilterTarget, extract_filter},
    input::{InputMap, InputValue},
    translate::{filter_predicate, node_pattern, related},
    write::{
        close_step,
        events::{Endpoints, EventKind, relationship_event, row_events},
        finish_node,
        validation::inverse_fields,
        write_args_parser::WriteMode,
    },
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, DuplicationPolicy, Entity, Filter, Narrowed, RelationField};

/// Connects the parent to every existing node matching `where`:
/// `{ where: { node: { .. } }, edge: { .. }, connect: { .. }, overwrite }`.
///
/// ```text
/// CALL {
///     WITH this
///     OPTIONAL MATCH (this_actors_connect0:Actor)
///     WHERE <where> AND <authorization filter>
///     WITH this, collect(DISTINCT this_actors_connect0) AS this_actors_connect0_nodes
///     UNWIND this_actors_connect0_nodes AS this_actors_connect0
///     WITH * WHERE <authorization of both nodes>
///     MERGE (this)<-[this_actors_connect0_rel:ACTED_IN]-(this_actors_connect0)
///     SET this_actors_connect0_rel.role = $this_actors_connect0_rel_role
///     <nested connects of this_actors_connect0>
/// }
/// ```
///
/// The relationship is merged unless the field allows duplicates. `overwrite` picks for a
/// single entry: `true` merges, `false` always creates.
pub(super) fn connect(
    session: &mut Session<'_>,
    step: &Step<'_>,
    entities: &[Entity],
    mut entry: InputMap,
) -> CompileResult<Vec<Call>> {
    check_keys(step, &entry, "connect", &["where", "edge", "connect", "overwrite"])?;

    let filter = connect_where(session, step, entry.shift_remove("where"))?;
    let edge = edge_args(step, entry.shift_remove("edge"), "connect", WriteMode::Create)?;

    let merge = match entry.shift_remove("overwrite").filter(|value| !value.is_null()) {
        Some(value) => value
            .as_scalar()
            .and_then(|value| value.as_bool())
            .ok_or_else(|| InputValidationError::invalid_value(step.path("connect.overwrite"), "Boolean", value.type_name()))?,
        None => step.field.duplication_policy() == DuplicationPolicy::Merge,
    };

    let nested = match entry.shift_remove("connect").filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&step.path("connect.connect"))?,
        None => InputMap::new(),
    };

    let parent = step.parent();
    let mut parent_auth =
        authorization_predicates(session, &parent.entity, AuthorizationOperation::Connect, &parent.variable)?;

    if step.ctx.node_is_new() {
        parent_auth = parent_auth.without_before();
    }

    let several = entities.len() > 1;
    let mut calls = Vec::with_capacity(entities.len());

    for entity in entities {
        // `{ node: { _on: { Movie: .. } } }` only reaches the listed types.
        if filter.is_narrowing_only() && !lists(&filter, entity) {
            continue;
        }

        let node = step.node(entity, several);

        let predicate = match filter.clone().narrow_to(entity) {
            Narrowed::Applies(filter) => filter_predicate(&filter, &node, Some(entity)),
            Narrowed::Excluded => continue,
        };

        if predicate.is_false() {
            continue;
        }

        let rel = node.child("rel");
        let nodes = node.child("nodes");
        let node_auth = authorization_predicates(session, entity, AuthorizationOperation::Connect, &node)?;
        let readable = node_auth.filter.clone().unwrap_or(Predicate::Literal(true));
        let auth = node_auth.and(parent_auth.clone());

        let mut body = Statement::new()
            .with(Match::optional(node_pattern(&node, entity)).so_that(predicate).so_that(readable))
            .with(
                With::new()
                    .item(&parent.variable)
                    .item((Expression::distinct_function("collect", vec![Expression::from(&node)]), nodes.clone())),
            )
            .with(Unwind::new(Expression::from(&nodes), &node));

        let allowed = Predicate::and([
            parent_auth.filter.clone().unwrap_or(Predicate::Literal(true)),
            auth.before_predicate(),
        ]);

        if !allowed.is_true() {
            body.push(With::star().so_that(allowed));
        }

        let pattern = related(&parent.variable, step.field, Some(&rel), NodePattern::new(&node));

        match (&edge, merge) {
            (Some(edge), true) => {
                body.push(Merge::new(pattern).on_create(edge.implicit_items(&rel)));

                let items = edge.input_items(&rel);

                if !items.is_empty() {
                    body.push(Set::new(items));
                }
            }
            (None, true) => {
                body.push(Merge::new(pattern));
            }
            (Some(edge), false) => {
                body.push(Create::new(pattern));

                if !edge.is_empty() {
                    body.push(Set::new(edge.set_items(&rel)));
                }
            }
            (None, false) => {
                body.push(Create::new(pattern));
            }
        }

        let ctx = step.ctx.enter(Frame::new(entity.clone(), node.clone(), Origin::Connect));
        let inputs = relation_inputs(entity, nested.clone(), "connect")?;

        let mut checked: Vec<RelationField> = inverse_fields(step.field, entity);
        checked.extend(inputs.iter().map(|(field, _)| field.clone()));

        let nested_meta = finish_node(session, &ctx, inputs, checked, auth.after_call(), &mut body)?;

        close_step(session, &mut body, &node, || {
            let connected = relationship_event(
                EventKind::CreateRelationship,
                &rel,
                step.field,
                Endpoints {
                    parent: (&parent.variable, &parent.entity),
                    node: (&node, entity),
                },
            );

            row_events(vec![connected], &nested_meta)
        });

        calls.push(step.call(body));
    }

    Ok(calls)
}

/// The `where` of a connect: `{ node: { .. } }`. No `where` connects every node.
fn connect_where(session: &mut Session<'_>, step: &Step<'_>, value: Option<InputValue>) -> CompileResult<Filter> {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return Ok(Filter::empty());
    };

    let mut map = value.into_map(&step.path("connect.where"))?;

    if let Some(key) = map.keys().find(|key| key.as_str() != "node") {
        return Err(InputValidationError::unknown_field(&step.path("connect.where"), key).into());
    }

    match map.shift_remove("node").filter(|value| !value.is_null()) {
        Some(node) => {
            let node = node.into_map(&step.path("connect.where.node"))?;
            extract_filter(session, node, &FilterTarget::from(step.field.target()))
        }
        None => Ok(Filter::empty()),
    }
}

/// Whether a type narrowing of `filter` has a branch for `entity`.
fn lists(filter: &Filter, entity: &Entity) -> bool {
    match filter {
        Filter::TypeNarrowing(narrowing) => narrowing.branch(entity).is_some(),
        Filter::And(filters) => filters.iter().any(|filter| lists(filter, entity)),
        _ => false,
    }
}
