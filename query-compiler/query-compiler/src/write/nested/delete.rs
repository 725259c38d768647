use super::{Step, check_keys, entry_where, match_related, nested_writes, relation_inputs};
use crate::{
    CompileResult,
    authorization::authorization_predicates,
    context::{Frame, Origin, Session},
    input::InputMap,
    write::{
        META, delete_collected,
        events::{EventKind, all_properties, collect_events, node_event, row_events},
    },
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, Entity};

/// Deletes the related nodes matching `where`, after their own nested deletes:
/// `{ where: { node, edge }, delete: { .. } }`.
///
/// ```text
/// CALL {
///     WITH this
///     MATCH (this)<-[this_actors_delete0_rel:ACTED_IN]-(this_actors_delete0:Actor)
///     WHERE <where> AND <authorization>
///     <nested deletes of this_actors_delete0>
///     WITH collect(DISTINCT this_actors_delete0) AS this_actors_delete0_deleted
///     CALL {
///         WITH this_actors_delete0_deleted
///         UNWIND this_actors_delete0_deleted AS this_actors_delete0
///         DETACH DELETE this_actors_delete0
///     }
/// }
/// ```
pub(super) fn nested_delete(
    session: &mut Session<'_>,
    step: &Step<'_>,
    entities: &[Entity],
    mut entry: InputMap,
) -> CompileResult<Vec<Call>> {
    check_keys(step, &entry, "delete", &["where", "delete"])?;

    let filter = entry_where(session, step.field, entry.shift_remove("where"))?;
    let nested = match entry.shift_remove("delete").filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&step.path("delete.delete"))?,
        None => InputMap::new(),
    };

    let several = entities.len() > 1;
    let mut calls = Vec::with_capacity(entities.len());

    for entity in entities {
        let node = step.node(entity, several);
        let rel = node.child("rel");
        let auth = authorization_predicates(session, entity, AuthorizationOperation::Delete, &node)?;

        let Some(matching) = match_related(step, entity, &node, &rel, &filter, auth.where_predicate()) else {
            continue;
        };

        let mut body = Statement::new().with(matching);

        let ctx = step.ctx.enter(Frame::new(entity.clone(), node.clone(), Origin::Delete));
        let inputs = relation_inputs(entity, nested.clone(), "delete")?;
        let nested_meta = nested_writes(session, &ctx, inputs)?.push_into(&mut body);

        let meta = node.child(META);
        let mut carried = Vec::new();

        if session.events() {
            let event = node_event(EventKind::Delete, &node, entity, all_properties(&node), Expression::null());
            carried.push((collect_events(row_events(vec![event], &nested_meta), &node), meta.clone()));
        }

        delete_collected(&mut body, &node, carried);

        if session.events() {
            body.push(Return::new().item(&meta));
        }

        calls.push(step.call(body));
    }

    Ok(calls)
}
