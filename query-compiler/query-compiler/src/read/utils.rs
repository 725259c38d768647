use crate::{
    CompileResult,
    extractors::{QueryArguments, extract_query_args},
    input::InputMap,
};
use cypher_builder::ast::*;
use indexmap::IndexMap;
use query_structure::{CompositeType, FieldContainer, OrderBy, SortOrder};

/// Computed fields evaluated ahead of the projection, by field name.
pub(crate) type Precomputed = IndexMap<String, Variable>;

/// Sorting and pagination of a read of `target`.
pub(crate) fn query_args(target: &CompositeType, options: Option<InputMap>) -> CompileResult<QueryArguments> {
    match target {
        CompositeType::Entity(entity) => {
            extract_query_args(options, Some(entity as &dyn FieldContainer), entity.limit())
        }
        CompositeType::Interface(interface) => extract_query_args(options, Some(interface as &dyn FieldContainer), None),
        CompositeType::Union(_) => extract_query_args(options, None, None),
    }
}

pub(crate) fn sort_direction(order: SortOrder) -> SortDirection {
    match order {
        SortOrder::Ascending => SortDirection::Ascending,
        SortOrder::Descending => SortDirection::Descending,
    }
}

/// Adds `ORDER BY .. SKIP .. LIMIT ..` to `with`. `None` when there is nothing to sort or
/// paginate. Skip and limit parameters are named after `node`.
pub(crate) fn paginate(
    mut with: With,
    args: &QueryArguments,
    node: &Variable,
    sort_key: impl Fn(&OrderBy) -> Expression,
) -> Option<With> {
    if args.is_empty() {
        return None;
    }

    for order_by in args.order_by.iter() {
        with = with.order_by(sort_key(order_by), sort_direction(order_by.sort_order()));
    }

    if let Some(offset) = args.offset {
        with = with.skip(Expression::param(format!("{node}_offset"), offset));
    }

    if let Some(limit) = args.limit {
        with = with.limit(Expression::param(format!("{node}_limit"), limit));
    }

    Some(with)
}

/// The value a node is sorted by: its property, or the precomputed value of a computed field.
pub(crate) fn node_sort_key(node: &Variable, order_by: &OrderBy, precomputed: &Precomputed) -> Expression {
    match order_by {
        OrderBy::Scalar(order) => node.property(order.field.db_name()),
        OrderBy::Computed(order) => precomputed
            .get(order.field.name())
            .map(Expression::from)
            .unwrap_or_else(|| node.property(order.field.name())),
    }
}

/// The value a projected map is sorted by, e.g. after a `UNION` of node types.
pub(crate) fn map_sort_key(map: Expression, order_by: &OrderBy) -> Expression {
    map.property(order_by.field_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_schema;

    #[test]
    fn nothing_to_paginate() {
        assert_eq!(None, paginate(With::star(), &QueryArguments::default(), &Variable::new("this"), |_| Expression::null()));
    }

    #[test]
    fn union_reads_cannot_sort() {
        let schema = test_schema::movies();
        let search = schema.composite_by_name("Search").unwrap();
        let options: InputMap = serde_json::from_str(r#"{ "sort": [{ "title": "ASC" }] }"#).unwrap();

        assert!(query_args(&search, Some(options)).is_err());
    }

    #[test]
    fn stored_fields_sort_on_their_property() {
        let schema = test_schema::movies();
        let movie = schema.entity_by_name("Movie").unwrap();
        let released = movie.find_scalar_field("released").unwrap();
        let order_by = OrderBy::scalar(released, SortOrder::Descending);

        assert_eq!(
            Variable::new("this").property("releaseYear"),
            node_sort_key(&Variable::new("this"), &order_by, &Precomputed::new())
        );
    }
}
