use super::{Step, check_keys, edge_args};
use crate::{
    CompileResult, InputValidationError,
    context::{Frame, Origin, Session},
    input::InputMap,
    translate::related,
    write::{
        close_step,
        create::{create_clauses, finish_created},
        events::{Endpoints, EventKind, all_properties, node_event, relationship_event, row_events},
        write_args_parser::WriteMode,
    },
};
use cypher_builder::ast::*;
use query_structure::{CompositeType, Entity};

/// Creates a node and connects it to the parent: `{ node: { .. }, edge: { .. } }`.
///
/// ```text
/// CALL {
///     WITH this0
///     CREATE (this0_actors0:Actor)
///     SET this0_actors0.name = $this0_actors0_name
///     CREATE (this0)<-[this0_actors0_rel:ACTED_IN]-(this0_actors0)
///     SET this0_actors0_rel.role = $this0_actors0_rel_role
///     <nested writes of this0_actors0>
///     <checks of this0_actors0>
/// }
/// ```
///
/// Interface fields name the type to create: `{ node: { Movie: { .. } } }`.
pub(super) fn nested_create(
    session: &mut Session<'_>,
    step: &Step<'_>,
    only: Option<&Entity>,
    mut entry: InputMap,
) -> CompileResult<Call> {
    check_keys(step, &entry, "create", &["node", "edge"])?;

    let node_input = entry
        .shift_remove("node")
        .filter(|value| !value.is_null())
        .ok_or_else(|| InputValidationError::MissingRequiredField {
            container: step.path("create"),
            field: String::from("node"),
        })?;

    let mut data = node_input.into_map(&step.path("create.node"))?;

    let entity = match (only, step.field.target()) {
        (Some(entity), _) => entity.clone(),
        (None, CompositeType::Entity(entity)) => entity,
        (None, target) => {
            let (name, fields) = data
                .shift_remove_index(0)
                .filter(|_| data.is_empty())
                .ok_or_else(|| InputValidationError::invalid_value(step.path("create.node"), "one node type", "several"))?;

            let entity = target
                .concrete_entities()
                .into_iter()
                .find(|entity| entity.name() == name)
                .ok_or_else(|| InputValidationError::unknown_field(target.name(), &name))?;

            data = fields.into_map(&step.path("create.node"))?;
            entity
        }
    };

    let node = step.variable.clone();
    let rel = node.child("rel");
    let parent = step.parent();
    let ctx = step.ctx.enter(Frame::new(entity.clone(), node.clone(), Origin::Create));

    let mut body = Statement::new();
    let nested = create_clauses(&ctx, data, &mut body)?;

    body.push(Create::new(related(&parent.variable, step.field, Some(&rel), NodePattern::new(&node))));

    if let Some(edge) = edge_args(step, entry.shift_remove("edge"), "create", WriteMode::Create)? {
        if !edge.is_empty() {
            body.push(Set::new(edge.set_items(&rel)));
        }
    }

    let nested_meta = finish_created(session, &ctx, nested, &mut body)?;

    close_step(session, &mut body, &node, || {
        let created = node_event(EventKind::Create, &node, &entity, Expression::null(), all_properties(&node));
        let connected = relationship_event(
            EventKind::CreateRelationship,
            &rel,
            step.field,
            Endpoints {
                parent: (&parent.variable, &parent.entity),
                node: (&node, &entity),
            },
        );

        row_events(vec![created, connected], &nested_meta)
    });

    Ok(step.call(body))
}
