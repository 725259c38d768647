use super::{Step, edge_args, entry_where, match_related};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    context::{Frame, Origin, Session},
    input::{InputMap, InputValue},
    write::{close_step, update::update_node, write_args_parser::WriteMode},
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, Entity};

/// Updates the related nodes matching `where`, and their relationships:
/// `{ where: { node, edge }, update: { node: { .. }, edge: { .. } } }`.
///
/// ```text
/// CALL {
///     WITH this
///     MATCH (this)<-[this_actors_update0_rel:ACTED_IN]-(this_actors_update0:Actor)
///     WHERE <where> AND <authorization>
///     SET this_actors_update0_rel.role = $this_actors_update0_rel_role
///     SET this_actors_update0.name = $this_actors_update0_name
///     <nested writes of this_actors_update0>
/// }
/// ```
pub(super) fn nested_update(
    session: &mut Session<'_>,
    step: &Step<'_>,
    entities: &[Entity],
    filter: Option<InputValue>,
    mut data: InputMap,
) -> CompileResult<Vec<Call>> {
    if let Some(key) = data.keys().find(|key| !matches!(key.as_str(), "node" | "edge")) {
        return Err(InputValidationError::unknown_field(&step.path("update"), key).into());
    }

    let filter = entry_where(session, step.field, filter)?;
    let node_data = match data.shift_remove("node").filter(|value| !value.is_null()) {
        Some(node) => node.into_map(&step.path("update.node"))?,
        None => InputMap::new(),
    };
    let edge = edge_args(step, data.shift_remove("edge"), "update", WriteMode::Update)?;

    let several = entities.len() > 1;
    let mut calls = Vec::with_capacity(entities.len());

    for entity in entities {
        let node = step.node(entity, several);
        let rel = node.child("rel");
        let auth = authorization_predicates(session, entity, AuthorizationOperation::Update, &node)?;

        let Some(matching) = match_related(step, entity, &node, &rel, &filter, auth.where_predicate()) else {
            tracing::trace!(entity = %entity, "update filter excludes node type");
            continue;
        };

        let mut body = Statement::new().with(matching);

        if let Some(edge) = &edge {
            let items = edge.input_items(&rel);

            if !items.is_empty() {
                body.push(Set::new(items));
            }
        }

        let ctx = step.ctx.enter(Frame::new(entity.clone(), node.clone(), Origin::Update));
        let written = update_node(session, &ctx, node_data.clone(), auth.after_call(), &mut body)?;

        close_step(session, &mut body, &node, || written.row_events(&node, entity));

        calls.push(step.call(body));
    }

    Ok(calls)
}
