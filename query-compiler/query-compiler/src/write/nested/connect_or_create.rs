use super::{Step, check_keys, edge_args};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    context::Session,
    extractors::typed_value,
    input::{InputMap, InputValue},
    translate::{field_value, node_pattern, related},
    write::{
        close_step,
        events::{Endpoints, EventKind, relationship_event, row_events},
        validation::{cardinality_checks, inverse_fields},
        write_args_parser::{WriteArgsParser, WriteMode},
    },
};
use cypher_builder::ast::*;
use graph_value::GraphValue;
use query_structure::{AuthorizationOperation, CompositeType, Entity, Field, FieldContainer, ScalarField};

/// Connects the parent to the node identified by unique properties, creating it when missing:
/// `{ where: { node: { id: .. } }, onCreate: { node: { .. }, edge: { .. } } }`.
///
/// ```text
/// CALL {
///     WITH this
///     MERGE (this_genres_connectOrCreate0:Genre { name: $this_genres_connectOrCreate0_name })
///     ON CREATE SET this_genres_connectOrCreate0.id = randomUUID()
///     WITH * WHERE <authorization of both nodes>
///     MERGE (this)-[this_genres_connectOrCreate0_rel:IN_GENRE]->(this_genres_connectOrCreate0)
///     <checks of this_genres_connectOrCreate0>
/// }
/// ```
pub(super) fn connect_or_create(
    session: &mut Session<'_>,
    step: &Step<'_>,
    only: Option<&Entity>,
    mut entry: InputMap,
) -> CompileResult<Call> {
    check_keys(step, &entry, "connectOrCreate", &["where", "onCreate"])?;

    let entity = match (only, step.field.target()) {
        (Some(entity), _) => entity.clone(),
        (None, CompositeType::Entity(entity)) => entity,
        (None, target) => {
            return Err(InputValidationError::unsupported(
                "connectOrCreate",
                target.name(),
                "the type of the node to create is ambiguous",
            )
            .into());
        }
    };

    let unique = unique_values(step, &entity, entry.shift_remove("where"))?;

    let mut on_create = match entry.shift_remove("onCreate").filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&step.path("connectOrCreate.onCreate"))?,
        None => InputMap::new(),
    };

    check_keys(step, &on_create, "connectOrCreate.onCreate", &["node", "edge"])?;

    let mut data = match on_create.shift_remove("node").filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&step.path("connectOrCreate.onCreate.node"))?,
        None => InputMap::new(),
    };

    // The identifying values count as written for the required field checks.
    for (field, value) in &unique {
        data.entry(field.name().to_owned())
            .or_insert_with(|| InputValue::Scalar(value.clone()));
    }

    let mut parser = WriteArgsParser::from(&entity, data, WriteMode::Create)?;

    if let Some((field, _)) = parser.nested.first() {
        return Err(InputValidationError::unsupported(
            "connectOrCreate",
            &field.to_string(),
            "relationship inputs are not allowed here",
        )
        .into());
    }

    parser.args.retain(|(field, _)| !unique.iter().any(|(identifying, _)| identifying == field));

    let edge = edge_args(step, on_create.shift_remove("edge"), "connectOrCreate.onCreate", WriteMode::Create)?;

    let node = step.variable.clone();
    let rel = node.child("rel");
    let parent = step.parent();

    let pattern = unique.into_iter().fold(node_pattern(&node, &entity), |pattern, (field, value)| {
        let hint = format!("{node}_{}", field.name());
        pattern.property(field.db_name(), field_value(&field, &hint, value))
    });

    let mut parent_auth =
        authorization_predicates(session, &parent.entity, AuthorizationOperation::Connect, &parent.variable)?;

    if step.ctx.node_is_new() {
        parent_auth = parent_auth.without_before();
    }

    let node_auth = authorization_predicates(session, &entity, AuthorizationOperation::Connect, &node)?;

    // Filter rules of the merged node and the parent, `before` rules of both.
    let allowed = Predicate::and([
        node_auth.filter.clone().unwrap_or(Predicate::Literal(true)),
        parent_auth.filter.clone().unwrap_or(Predicate::Literal(true)),
        node_auth.before_predicate(),
        parent_auth.before_predicate(),
    ]);

    let auth = authorization_predicates(session, &entity, AuthorizationOperation::Create, &node)?
        .without_before()
        .and(node_auth)
        .and(parent_auth);

    let mut body = Statement::new().with(Merge::new(pattern).on_create(parser.set_items(&node)));

    if !allowed.is_true() {
        body.push(With::star().so_that(allowed));
    }

    let mut edge_merge = Merge::new(related(&parent.variable, step.field, Some(&rel), NodePattern::new(&node)));

    if let Some(edge) = &edge {
        edge_merge = edge_merge.on_create(edge.set_items(&rel));
    }

    body.push(edge_merge);

    for check in cardinality_checks(session, &node, inverse_fields(step.field, &entity)) {
        body.push(check);
    }

    if let Some(after) = auth.after_call() {
        body.push(after);
    }

    close_step(session, &mut body, &node, || {
        let connected = relationship_event(
            EventKind::CreateRelationship,
            &rel,
            step.field,
            Endpoints {
                parent: (&parent.variable, &parent.entity),
                node: (&node, &entity),
            },
        );

        row_events(vec![connected], &[])
    });

    Ok(step.call(body))
}

/// The unique properties of `where.node`, with plain values.
fn unique_values(
    step: &Step<'_>,
    entity: &Entity,
    value: Option<InputValue>,
) -> CompileResult<Vec<(ScalarField, GraphValue)>> {
    let path = step.path("connectOrCreate.where");

    let mut map = match value.filter(|value| !value.is_null()) {
        Some(value) => value.into_map(&path)?,
        None => {
            return Err(InputValidationError::MissingRequiredField {
                container: step.path("connectOrCreate"),
                field: String::from("where"),
            }
            .into());
        }
    };

    check_keys(step, &map, "connectOrCreate.where", &["node"])?;

    let node = match map.shift_remove("node").filter(|value| !value.is_null()) {
        Some(node) => node.into_map(&format!("{path}.node"))?,
        None => InputMap::new(),
    };

    if node.is_empty() {
        return Err(InputValidationError::invalid_value(format!("{path}.node"), "a unique field", "nothing").into());
    }

    node.into_iter()
        .map(|(key, value)| match entity.find_field(&key) {
            Some(Field::Scalar(field)) if field.is_unique() => {
                let value = typed_value(&field.to_string(), field.type_identifier(), value)?;
                Ok((field, value))
            }
            Some(_) => Err(InputValidationError::unsupported(
                "connectOrCreate",
                &format!("{entity}.{key}"),
                "only unique fields identify the node",
            )
            .into()),
            None => Err(InputValidationError::unknown_field(&format!("{path}.node"), &key).into()),
        })
        .collect()
}
