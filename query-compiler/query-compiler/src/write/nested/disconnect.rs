use super::{Step, check_keys, entry_where, match_related, nested_writes, relation_inputs};
use crate::{
    CompileResult,
    authorization::authorization_predicates,
    context::{Frame, Origin, Session},
    input::InputMap,
    write::{
        close_step,
        events::{Endpoints, EventKind, relationship_event, row_events},
        validation::{cardinality_checks, inverse_fields},
    },
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, Entity};

/// Deletes the relationships to the related nodes matching `where`, then continues with their
/// own disconnects: `{ where: { node, edge }, disconnect: { .. } }`.
///
/// ```text
/// CALL {
///     WITH this
///     MATCH (this)<-[this_actors_disconnect0_rel:ACTED_IN]-(this_actors_disconnect0:Actor)
///     WHERE <where> AND <authorization of both nodes>
///     <nested disconnects of this_actors_disconnect0>
///     DELETE this_actors_disconnect0_rel
/// }
/// ```
pub(super) fn disconnect(
    session: &mut Session<'_>,
    step: &Step<'_>,
    entities: &[Entity],
    mut entry: InputMap,
) -> CompileResult<Vec<Call>> {
    check_keys(step, &entry, "disconnect", &["where", "disconnect"])?;

    let filter = entry_where(session, step.field, entry.shift_remove("where"))?;
    let nested = match entry.shift_remove("disconnect").filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&step.path("disconnect.disconnect"))?,
        None => InputMap::new(),
    };

    let parent = step.parent();
    let mut parent_auth =
        authorization_predicates(session, &parent.entity, AuthorizationOperation::Disconnect, &parent.variable)?;

    if step.ctx.node_is_new() {
        parent_auth = parent_auth.without_before();
    }

    let several = entities.len() > 1;
    let mut calls = Vec::with_capacity(entities.len());

    for entity in entities {
        let node = step.node(entity, several);
        let rel = node.child("rel");
        let auth = authorization_predicates(session, entity, AuthorizationOperation::Disconnect, &node)?
            .and(parent_auth.clone());

        let Some(matching) = match_related(step, entity, &node, &rel, &filter, auth.where_predicate()) else {
            continue;
        };

        let mut body = Statement::new().with(matching);

        let ctx = step.ctx.enter(Frame::new(entity.clone(), node.clone(), Origin::Disconnect));
        let inputs = relation_inputs(entity, nested.clone(), "disconnect")?;
        let nested_meta = nested_writes(session, &ctx, inputs)?.push_into(&mut body);

        // The relationship is gone once deleted, its event is read before.
        let events = node.child("disconnected");

        if session.events() {
            let event = relationship_event(
                EventKind::DeleteRelationship,
                &rel,
                step.field,
                Endpoints {
                    parent: (&parent.variable, &parent.entity),
                    node: (&node, entity),
                },
            );

            body.push(With::star().item((row_events(vec![event], &nested_meta), events.clone())));
        }

        body.push(Delete::new(&rel));

        for check in cardinality_checks(session, &node, inverse_fields(step.field, entity)) {
            body.push(check);
        }

        if let Some(after) = auth.after_call() {
            body.push(after);
        }

        close_step(session, &mut body, &node, || Expression::from(&events));

        calls.push(step.call(body));
    }

    Ok(calls)
}
