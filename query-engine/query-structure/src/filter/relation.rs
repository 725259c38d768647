use super::Filter;
use crate::{Entity, RelationField};
use graph_value::GraphValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationCondition {
    /// At least one related node matches.
    Some,
    /// No related node matches.
    None,
    /// At least one related node exists and every related node matches.
    All,
    /// Exactly one related node matches.
    Single,
}

impl RelationCondition {
    pub fn from_suffix(suffix: &str) -> Option<RelationCondition> {
        let condition = match suffix {
            "_SOME" => RelationCondition::Some,
            "_NONE" => RelationCondition::None,
            "_ALL" => RelationCondition::All,
            "_SINGLE" => RelationCondition::Single,
            _ => return None,
        };

        Some(condition)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationFilter {
    pub field: RelationField,
    pub condition: RelationCondition,
    /// Filter over the related node.
    pub nested: Box<Filter>,
}

/// Filter over the edges of a relationship, combining node and edge conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeFilter {
    And(Vec<EdgeFilter>),
    Or(Vec<EdgeFilter>),
    Not(Box<EdgeFilter>),
    Node(Filter),
    Edge(Filter),
}

impl EdgeFilter {
    pub fn and(filters: Vec<EdgeFilter>) -> EdgeFilter {
        match filters.len() {
            1 => filters.into_iter().next().unwrap_or(EdgeFilter::And(Vec::new())),
            _ => EdgeFilter::And(filters),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            EdgeFilter::And(filters) | EdgeFilter::Or(filters) => filters.iter().all(EdgeFilter::is_empty),
            EdgeFilter::Not(inner) => inner.is_empty(),
            EdgeFilter::Node(f) | EdgeFilter::Edge(f) => f.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionFilter {
    pub field: RelationField,
    pub condition: RelationCondition,
    pub nested: Box<EdgeFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountComparison {
    Equals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

/// Compares the number of related nodes with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationFilter {
    pub field: RelationField,
    pub comparison: CountComparison,
    pub value: GraphValue,
}

/// Conditions that only apply to some concrete types of an interface or union.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNarrowingFilter {
    pub branches: Vec<(Entity, Filter)>,
    /// Types without a branch never match. Set for unions, unset for interfaces.
    pub exclude_unlisted: bool,
}

impl TypeNarrowingFilter {
    pub fn branch(&self, entity: &Entity) -> Option<&Filter> {
        self.branches.iter().find(|(e, _)| e == entity).map(|(_, f)| f)
    }
}
