mod compare;
mod relation;
mod scalar;

pub use compare::*;
pub use relation::*;
pub use scalar::*;

use crate::Entity;

/// The filter IR. Produced from filter inputs and authorization rules, translated into predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// Negation of the conjunction of all children.
    Not(Vec<Filter>),
    Scalar(ScalarFilter),
    Relation(RelationFilter),
    Connection(ConnectionFilter),
    Aggregation(AggregationFilter),
    TypeNarrowing(TypeNarrowingFilter),
    Claim(ClaimFilter),
    /// The request carries a valid token.
    Authenticated,
    /// Matches nothing.
    Never,
    /// Matches everything.
    Empty,
}

/// Result of restricting a filter to one concrete type.
#[derive(Debug, Clone, PartialEq)]
pub enum Narrowed {
    Applies(Filter),
    /// The filter can never match nodes of the type.
    Excluded,
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        let mut filters: Vec<Filter> = filters.into_iter().filter(|f| !f.is_empty()).collect();

        match filters.len() {
            0 => Filter::Empty,
            1 => filters.pop().unwrap_or(Filter::Empty),
            _ => Filter::And(filters),
        }
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        match filters.len() {
            1 => filters.into_iter().next().unwrap_or(Filter::Never),
            _ => Filter::Or(filters),
        }
    }

    pub fn not(filters: Vec<Filter>) -> Self {
        Filter::Not(filters)
    }

    pub fn empty() -> Self {
        Filter::Empty
    }

    /// Whether the filter is trivially true.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Empty => true,
            Filter::And(filters) => filters.iter().all(Filter::is_empty),
            _ => false,
        }
    }

    /// Restricts the filter to nodes of one concrete type, resolving type narrowing.
    ///
    /// A narrowing without a branch for `entity` yields no condition when unlisted types are
    /// allowed (interfaces) and excludes the type otherwise (unions).
    pub fn narrow_to(self, entity: &Entity) -> Narrowed {
        match self {
            Filter::TypeNarrowing(narrowing) => {
                let exclude_unlisted = narrowing.exclude_unlisted;

                match narrowing.branches.into_iter().find(|(e, _)| e == entity) {
                    Some((_, filter)) => filter.narrow_to(entity),
                    None if exclude_unlisted => Narrowed::Excluded,
                    None => Narrowed::Applies(Filter::Empty),
                }
            }
            Filter::And(filters) => {
                let mut narrowed = Vec::with_capacity(filters.len());

                for filter in filters {
                    match filter.narrow_to(entity) {
                        Narrowed::Applies(f) => narrowed.push(f),
                        Narrowed::Excluded => return Narrowed::Excluded,
                    }
                }

                Narrowed::Applies(Filter::and(narrowed))
            }
            Filter::Or(filters) => {
                let narrowed: Vec<Filter> = filters
                    .into_iter()
                    .filter_map(|f| match f.narrow_to(entity) {
                        Narrowed::Applies(f) => Some(f),
                        Narrowed::Excluded => None,
                    })
                    .collect();

                if narrowed.is_empty() {
                    Narrowed::Excluded
                } else {
                    Narrowed::Applies(Filter::or(narrowed))
                }
            }
            Filter::Not(filters) => {
                let mut narrowed = Vec::with_capacity(filters.len());

                for filter in filters {
                    match filter.narrow_to(entity) {
                        Narrowed::Applies(f) => narrowed.push(f),
                        // NOT of a conjunction containing false is true.
                        Narrowed::Excluded => return Narrowed::Applies(Filter::Empty),
                    }
                }

                Narrowed::Applies(Filter::Not(narrowed))
            }
            Filter::Never => Narrowed::Excluded,
            other => Narrowed::Applies(other),
        }
    }

    /// True if the filter is a bare type narrowing, with no condition shared by all types.
    pub fn is_narrowing_only(&self) -> bool {
        match self {
            Filter::TypeNarrowing(_) => true,
            Filter::And(filters) => {
                let mut relevant = filters.iter().filter(|f| !f.is_empty()).peekable();
                relevant.peek().is_some() && relevant.all(Filter::is_narrowing_only)
            }
            _ => false,
        }
    }
}

impl From<ScalarFilter> for Filter {
    fn from(sf: ScalarFilter) -> Self {
        Filter::Scalar(sf)
    }
}

impl From<RelationFilter> for Filter {
    fn from(rf: RelationFilter) -> Self {
        Filter::Relation(rf)
    }
}

impl From<ConnectionFilter> for Filter {
    fn from(cf: ConnectionFilter) -> Self {
        Filter::Connection(cf)
    }
}

impl From<AggregationFilter> for Filter {
    fn from(af: AggregationFilter) -> Self {
        Filter::Aggregation(af)
    }
}

impl From<ClaimFilter> for Filter {
    fn from(cf: ClaimFilter) -> Self {
        Filter::Claim(cf)
    }
}
