//! Translation of the filter IR and the schema into statement fragments.

mod filter;

pub(crate) use filter::*;

use cypher_builder::ast::*;
use query_structure::{Entity, RelationDirection, RelationField};

/// `(var:Label1:Label2)`
pub(crate) fn node_pattern(variable: &Variable, entity: &Entity) -> NodePattern {
    NodePattern::new(variable).labels(entity.labels().iter().cloned())
}

/// The relationship of `field`, seen from the node holding the field.
pub(crate) fn relationship(field: &RelationField, directed: bool) -> RelationshipPattern {
    let direction = match (directed, field.direction()) {
        (false, _) => PatternDirection::Undirected,
        (true, RelationDirection::Out) => PatternDirection::Outgoing,
        (true, RelationDirection::In) => PatternDirection::Incoming,
    };

    RelationshipPattern::new(direction).rel_type(field.rel_type())
}

/// `(from)-[rel:TYPE]->(to)` following the declared direction.
pub(crate) fn related(from: &Variable, field: &RelationField, rel: Option<&Variable>, to: NodePattern) -> Pattern {
    related_in_direction(from, field, rel, to, true)
}

pub(crate) fn related_in_direction(
    from: &Variable,
    field: &RelationField,
    rel: Option<&Variable>,
    to: NodePattern,
    directed: bool,
) -> Pattern {
    let mut relationship = relationship(field, directed);

    if let Some(rel) = rel {
        relationship = relationship.variable(rel);
    }

    Pattern::node(NodePattern::new(from)).related(relationship, to)
}

/// Label check used when several node types share a variable.
pub(crate) fn has_type(variable: &Variable, entity: &Entity) -> Predicate {
    variable.has_labels(entity.labels().iter().cloned())
}

/// Whether a read follows the declared direction. `directed: false` lifts it on fields allowing
/// undirected queries.
pub(crate) fn directed_read(field: &RelationField, arguments: &crate::input::InputMap) -> bool {
    let undirected = arguments
        .get("directed")
        .and_then(|value| value.as_scalar())
        .and_then(|value| value.as_bool())
        .is_some_and(|directed| !directed);

    !(undirected && field.undirected_queries())
}
