//! Change events, returned in the `meta` column when enabled.
//!
//! Each write step returns the events of its rows as a list, `{step}_meta`. The parent
//! concatenates the lists of its nested steps with its own events, so the top level returns all
//! events of the program in execution order.

use cypher_builder::ast::*;
use query_structure::{Entity, RelationDirection, RelationField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    Create,
    Update,
    Delete,
    CreateRelationship,
    DeleteRelationship,
}

impl EventKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
            EventKind::CreateRelationship => "create_relationship",
            EventKind::DeleteRelationship => "delete_relationship",
        }
    }
}

/// `node { .* }`
pub(crate) fn all_properties(variable: &Variable) -> Expression {
    Expression::map_projection(variable, vec![MapProjectionItem::AllProperties])
}

/// `{ event, id, timestamp, typename, properties: { old, new } }`
pub(crate) fn node_event(kind: EventKind, node: &Variable, entity: &Entity, old: Expression, new: Expression) -> Expression {
    Expression::map([
        ("event", Expression::string(kind.as_str())),
        ("id", element_id(node)),
        ("timestamp", Expression::function("timestamp", Vec::new())),
        ("typename", Expression::string(entity.name())),
        ("properties", Expression::map([("old", old), ("new", new)])),
    ])
}

/// The two ends of a relationship written through `field`.
pub(crate) struct Endpoints<'a> {
    pub(crate) parent: (&'a Variable, &'a Entity),
    pub(crate) node: (&'a Variable, &'a Entity),
}

/// `{ event, id, timestamp, relationshipName, fromId, toId, fromTypename, toTypename, properties }`,
/// `from` and `to` following the stored direction of the relationship.
pub(crate) fn relationship_event(kind: EventKind, rel: &Variable, field: &RelationField, ends: Endpoints<'_>) -> Expression {
    let ((from, from_entity), (to, to_entity)) = match field.direction() {
        RelationDirection::Out => (ends.parent, ends.node),
        RelationDirection::In => (ends.node, ends.parent),
    };

    Expression::map([
        ("event", Expression::string(kind.as_str())),
        ("id", element_id(rel)),
        ("timestamp", Expression::function("timestamp", Vec::new())),
        ("relationshipName", Expression::string(field.rel_type())),
        ("fromId", element_id(from)),
        ("toId", element_id(to)),
        ("fromTypename", Expression::string(from_entity.name())),
        ("toTypename", Expression::string(to_entity.name())),
        (
            "properties",
            Expression::map([
                ("from", all_properties(from)),
                ("to", all_properties(to)),
                ("relationship", all_properties(rel)),
            ]),
        ),
    ])
}

fn element_id(variable: &Variable) -> Expression {
    Expression::function("elementId", vec![Expression::from(variable)])
}

/// `[own, ..] + a_meta + b_meta`: the events of one row, its own first.
pub(crate) fn row_events(own: Vec<Expression>, nested: &[Variable]) -> Expression {
    nested
        .iter()
        .fold(Expression::list(own), |events, meta| events.binary(BinaryOperator::Add, Expression::from(meta)))
}

/// `reduce(acc = [], e IN collect(row) | acc + e)`: the events of every row, as one list.
/// Aggregates, so the step returns a single row even when it matched nothing.
pub(crate) fn collect_events(row: Expression, step: &Variable) -> Expression {
    let accumulator = step.child("acc");
    let events = step.child("events");

    Expression::reduce(Reduce {
        expression: Expression::from(&accumulator).binary(BinaryOperator::Add, Expression::from(&events)),
        accumulator,
        initial: Expression::list(Vec::new()),
        variable: events,
        list: row.collect(),
    })
}
