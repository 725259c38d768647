//! Nested writes through relationship fields.
//!
//! The input of a relationship field depends on how its node is written:
//!
//! | Node written by | Input                                                                      |
//! |---              |---                                                                         |
//! | create          | `{ create, connect, connectOrCreate }`                                     |
//! | update          | `[{ where, update, create, connect, disconnect, delete, connectOrCreate }]` |
//! | connect         | `[{ where, edge, connect, overwrite }]`                                    |
//! | disconnect      | `[{ where, disconnect }]`                                                  |
//! | delete          | `[{ where, delete }]`                                                      |
//!
//! Union fields take one input per member: `{ Movie: .., Genre: .. }`. Singular fields take a
//! single object where list fields take a list.
//!
//! Each entry becomes one subquery per node type it may reach, named after the parent, the field
//! and the operation: `this_actors_connect0`.

mod connect;
mod connect_or_create;
mod create;
mod delete;
mod disconnect;
mod update;

use super::{
    Subqueries,
    write_args_parser::{WriteArgsParser, WriteMode},
};
use crate::{
    CompileResult, InputValidationError,
    context::{Frame, Origin, Session, TraversalContext},
    extractors::extract_connection_where,
    input::{InputMap, InputValue, coerce_vec},
    translate::{edge_predicate, node_pattern, related},
};
use cypher_builder::ast::*;
use query_structure::{CompositeType, EdgeFilter, Entity, Field, FieldContainer, NestedOperation, RelationField};
use std::collections::HashMap;

/// Compiles the relationship inputs of the node in `ctx`, in input order.
pub(crate) fn nested_writes(
    session: &mut Session<'_>,
    ctx: &TraversalContext,
    nested: Vec<(RelationField, InputValue)>,
) -> CompileResult<Subqueries> {
    let mut writer = NestedWriter {
        ctx,
        names: HashMap::new(),
        subqueries: Subqueries::default(),
    };

    for (field, value) in nested {
        writer.field(session, &field, value)?;
    }

    Ok(writer.subqueries)
}

/// Resolves the keys of a `connect`, `disconnect` or `delete` map to relationship fields of
/// `entity`.
pub(crate) fn relation_inputs(
    entity: &Entity,
    map: InputMap,
    operation: &str,
) -> CompileResult<Vec<(RelationField, InputValue)>> {
    let mut inputs = Vec::with_capacity(map.len());

    for (key, value) in map {
        match entity.find_field(&key) {
            Some(Field::Relation(rf)) => {
                if !value.is_null() {
                    inputs.push((rf, value));
                }
            }
            Some(_) => {
                return Err(InputValidationError::NotARelationship {
                    container: entity.name().to_owned(),
                    field: key,
                }
                .into());
            }
            None => return Err(InputValidationError::unknown_field(&format!("{entity}.{operation}"), &key).into()),
        }
    }

    Ok(inputs)
}

struct NestedWriter<'c> {
    ctx: &'c TraversalContext,
    /// Next index per variable base name.
    names: HashMap<String, usize>,
    subqueries: Subqueries,
}

impl<'c> NestedWriter<'c> {
    fn field(&mut self, session: &mut Session<'_>, field: &RelationField, value: InputValue) -> CompileResult<()> {
        match field.target() {
            CompositeType::Union(union) => {
                for (member, value) in value.into_map(&field.to_string())? {
                    let entity = union
                        .member(&member)
                        .ok_or_else(|| InputValidationError::unknown_field(union.name(), &member))?;

                    self.input(session, field, Some(&entity), value)?;
                }

                Ok(())
            }
            _ => self.input(session, field, None, value),
        }
    }

    /// `only` restricts the writes to one member of a union.
    fn input(
        &mut self,
        session: &mut Session<'_>,
        field: &RelationField,
        only: Option<&Entity>,
        value: InputValue,
    ) -> CompileResult<()> {
        match self.ctx.node().origin {
            Origin::Create => {
                for (key, value) in value.into_map(&field.to_string())? {
                    let operation = NestedOperation::from_input_key(&key)
                        .filter(|operation| {
                            matches!(
                                operation,
                                NestedOperation::Create | NestedOperation::Connect | NestedOperation::ConnectOrCreate
                            )
                        })
                        .ok_or_else(|| InputValidationError::unknown_field(&field.to_string(), &key))?;

                    self.operation(session, field, only, operation, value, None)?;
                }
            }
            Origin::Update => {
                for mut entry in entries(field, value, "update")? {
                    let filter = entry.shift_remove("where");

                    for (key, value) in entry {
                        let operation = NestedOperation::from_input_key(&key)
                            .ok_or_else(|| InputValidationError::unknown_field(&field.to_string(), &key))?;

                        self.operation(session, field, only, operation, value, filter.clone())?;
                    }
                }
            }
            Origin::Connect => self.operation(session, field, only, NestedOperation::Connect, value, None)?,
            Origin::Disconnect => self.operation(session, field, only, NestedOperation::Disconnect, value, None)?,
            Origin::Delete => self.operation(session, field, only, NestedOperation::Delete, value, None)?,
            Origin::Read | Origin::ConnectOrCreate => {
                return Err(InputValidationError::unsupported(
                    "write",
                    &field.to_string(),
                    "relationship inputs are not allowed here",
                )
                .into());
            }
        }

        Ok(())
    }

    fn operation(
        &mut self,
        session: &mut Session<'_>,
        field: &RelationField,
        only: Option<&Entity>,
        operation: NestedOperation,
        value: InputValue,
        filter: Option<InputValue>,
    ) -> CompileResult<()> {
        if !field.allows(operation) {
            return Err(InputValidationError::DisallowedNestedOperation {
                field: field.to_string(),
                operation: operation.input_key().to_owned(),
            }
            .into());
        }

        if value.is_null() {
            return Ok(());
        }

        let entities = match only {
            Some(entity) => vec![entity.clone()],
            None => field.target().concrete_entities(),
        };

        if operation == NestedOperation::Update {
            let data = value.into_map(&format!("{field}.update"))?;
            let step = self.step(field, operation);

            for call in update::nested_update(session, &step, &entities, filter, data)? {
                self.subqueries.push(call);
            }

            return Ok(());
        }

        for entry in entries(field, value, operation.input_key())? {
            let step = self.step(field, operation);

            let calls = match operation {
                NestedOperation::Create => vec![create::nested_create(session, &step, only, entry)?],
                NestedOperation::Connect => connect::connect(session, &step, &entities, entry)?,
                NestedOperation::ConnectOrCreate => {
                    vec![connect_or_create::connect_or_create(session, &step, only, entry)?]
                }
                NestedOperation::Disconnect => disconnect::disconnect(session, &step, &entities, entry)?,
                NestedOperation::Delete => delete::nested_delete(session, &step, &entities, entry)?,
                NestedOperation::Update => Vec::new(),
            };

            for call in calls {
                self.subqueries.push(call);
            }
        }

        Ok(())
    }

    /// `this_actors0` for creates, `this_actors_connect0` for the other operations.
    fn step<'f>(&mut self, field: &'f RelationField, operation: NestedOperation) -> Step<'f>
    where
        'c: 'f,
    {
        let base = match operation {
            NestedOperation::Create => field.name().to_owned(),
            operation => format!("{}_{}", field.name(), operation.input_key()),
        };

        let index = self.names.entry(base.clone()).or_default();
        let variable = self.ctx.node().variable.child(format!("{base}{index}"));
        *index += 1;

        Step {
            ctx: self.ctx,
            field,
            variable,
        }
    }
}

/// The entries of a nested operation. Singular fields take a single object.
fn entries(field: &RelationField, value: InputValue, operation: &str) -> CompileResult<Vec<InputMap>> {
    if !field.is_list() && matches!(value, InputValue::List(_)) {
        return Err(InputValidationError::ExpectedSingle {
            field: field.to_string(),
        }
        .into());
    }

    coerce_vec(value)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| Ok(entry.into_map(&format!("{field}.{operation}[{index}]"))?))
        .collect()
}

/// One entry of a nested write: the relationship from the parent node it goes through and the
/// variable of the node it writes.
pub(super) struct Step<'a> {
    pub(super) ctx: &'a TraversalContext,
    pub(super) field: &'a RelationField,
    pub(super) variable: Variable,
}

impl Step<'_> {
    pub(super) fn parent(&self) -> &Frame {
        self.ctx.node()
    }

    /// The variable of the written node of type `entity`, suffixed with the type when the entry
    /// reaches several.
    pub(super) fn node(&self, entity: &Entity, several: bool) -> Variable {
        if several {
            self.variable.child(entity.name())
        } else {
            self.variable.clone()
        }
    }

    /// The subquery of the entry, importing the parent node.
    pub(super) fn call(&self, body: Statement) -> Call {
        Call::new(body).import(&self.parent().variable)
    }

    pub(super) fn path(&self, key: &str) -> String {
        format!("{}.{}", self.field, key)
    }
}

/// The `where` of an entry: `{ node: { .. }, edge: { .. } }`.
pub(super) fn entry_where(
    session: &mut Session<'_>,
    field: &RelationField,
    value: Option<InputValue>,
) -> CompileResult<EdgeFilter> {
    match value {
        Some(value) if !value.is_null() => {
            let map = value.into_map(&format!("{field}.where"))?;
            extract_connection_where(session, map, field)
        }
        _ => Ok(EdgeFilter::And(Vec::new())),
    }
}

/// `MATCH (parent)-[rel:TYPE]-(node:Label) WHERE <where> AND <extra>` over existing related nodes.
/// `None` when the filter excludes the type.
pub(super) fn match_related(
    step: &Step<'_>,
    entity: &Entity,
    node: &Variable,
    rel: &Variable,
    filter: &EdgeFilter,
    extra: Predicate,
) -> Option<Match> {
    let predicate = edge_predicate(filter, node, rel, entity);

    if predicate.is_false() {
        return None;
    }

    let pattern = related(&step.parent().variable, step.field, Some(rel), node_pattern(node, entity));

    Some(Match::new(pattern).so_that(predicate).so_that(extra))
}

/// Parses the `edge` of an entry. `None` when the relationship has no properties.
pub(super) fn edge_args(
    step: &Step<'_>,
    edge: Option<InputValue>,
    operation: &str,
    mode: WriteMode,
) -> CompileResult<Option<WriteArgsParser>> {
    let edge = edge.filter(|value| !value.is_null());

    let Some(properties) = step.field.properties() else {
        return match edge {
            Some(_) => Err(InputValidationError::unknown_field(&step.path(operation), "edge").into()),
            None => Ok(None),
        };
    };

    let map = match edge {
        Some(edge) => edge.into_map(&step.path(&format!("{operation}.edge")))?,
        None => InputMap::new(),
    };

    Ok(Some(WriteArgsParser::from(&properties, map, mode)?))
}

/// Rejects the keys of `entry` other than `allowed`.
pub(super) fn check_keys(step: &Step<'_>, entry: &InputMap, operation: &str, allowed: &[&str]) -> CompileResult<()> {
    match entry.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(InputValidationError::unknown_field(&step.path(operation), key).into()),
        None => Ok(()),
    }
}
