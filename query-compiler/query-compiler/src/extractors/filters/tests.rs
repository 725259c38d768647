use super::*;
use crate::{CompileError, CompilerConfig, RequestContext, SchemaAuthorization, context::Session, test_schema};
use graph_value::GraphValue;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn input(value: serde_json::Value) -> InputMap {
    InputValue::try_from(value).unwrap().into_map("where").unwrap()
}

/// Extracts `value` against the composite named `target`, with the deprecations it reported.
fn extract(target: &str, value: serde_json::Value) -> (CompileResult<Filter>, Vec<String>) {
    let schema = test_schema::movies();
    let config = CompilerConfig::default();
    let request = RequestContext::anonymous();
    let mut session = Session::new(&schema, &config, &SchemaAuthorization, &request);

    let target = FilterTarget::from(schema.composite_by_name(target).unwrap());
    let filter = extract_filter(&mut session, input(value), &target);
    let diagnostics = session.into_diagnostics().into_iter().map(|d| d.message).collect();

    (filter, diagnostics)
}

#[test]
fn keys_become_a_conjunction() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let title = movie.find_scalar_field("title").unwrap();
    let released = movie.find_scalar_field("released").unwrap();

    let (filter, diagnostics) = extract("Movie", json!({ "title": "Heat", "released_GT": 1990 }));

    assert_eq!(
        Filter::And(vec![title.equals("Heat"), released.greater_than(1990i64)]),
        filter.unwrap()
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn empty_combinators_are_no_condition() {
    let (filter, _) = extract("Movie", json!({ "AND": [], "OR": [], "NOT": {} }));
    assert_eq!(Filter::Empty, filter.unwrap());
}

#[test]
fn negated_operators_are_deprecated() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let title = movie.find_scalar_field("title").unwrap();

    let (filter, diagnostics) = extract("Movie", json!({ "title_NOT": "Heat" }));

    assert_eq!(title.not_equals("Heat"), filter.unwrap());
    assert_eq!(vec!["`Movie.title_NOT` is deprecated, use `NOT: { title }` instead.".to_owned()], diagnostics);
}

#[test]
fn list_relationships_without_quantifier_mean_some() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let actor = schema.entity_by_name("Actor").unwrap();
    let actors = movie.find_relation_field("actors").unwrap();
    let name = actor.find_scalar_field("name").unwrap();

    let (filter, diagnostics) = extract("Movie", json!({ "actors": { "name": "Keanu Reeves" } }));

    assert_eq!(actors.some_related(name.equals("Keanu Reeves")), filter.unwrap());
    assert_eq!(
        vec!["`Movie.actors` is deprecated, use `actors_SOME` instead.".to_owned()],
        diagnostics
    );
}

#[test]
fn null_singular_relationship_asks_for_absence() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let director = movie.find_relation_field("director").unwrap();

    let (filter, _) = extract("Movie", json!({ "director": null }));

    assert_eq!(director.one_relation_is_null(), filter.unwrap());
}

#[test]
fn quantifiers_need_list_relationships() {
    let (filter, _) = extract("Movie", json!({ "director_SOME": { "name": "Michael Mann" } }));

    assert_eq!(
        CompileError::from(InputValidationError::InvalidOperator {
            field: "Movie.director".to_owned(),
            operator: "_SOME".to_owned(),
        }),
        filter.unwrap_err()
    );
}

#[test]
fn operators_must_fit_the_field_type() {
    let (filter, _) = extract("Movie", json!({ "released_CONTAINS": 19 }));

    assert_eq!(
        CompileError::from(InputValidationError::InvalidOperator {
            field: "Movie.released".to_owned(),
            operator: "_CONTAINS".to_owned(),
        }),
        filter.unwrap_err()
    );
}

#[test]
fn computed_fields_cannot_be_filtered() {
    let (filter, _) = extract("Movie", json!({ "score": 4.5 }));

    assert_eq!(
        CompileError::from(InputValidationError::InvalidOperator {
            field: "Movie.score".to_owned(),
            operator: "filter".to_owned(),
        }),
        filter.unwrap_err()
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let (filter, _) = extract("Movie", json!({ "budget_GT": 10 }));

    assert_eq!(
        CompileError::from(InputValidationError::UnknownFilter {
            container: "Movie".to_owned(),
            key: "budget_GT".to_owned(),
        }),
        filter.unwrap_err()
    );
}

#[test]
fn values_must_fit_the_field_type() {
    let (filter, _) = extract("Movie", json!({ "released": "1995" }));

    assert!(matches!(
        filter.unwrap_err(),
        CompileError::Input(InputValidationError::InvalidValue { .. })
    ));
}

#[test]
fn interface_narrowing_keeps_unlisted_types() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let series = schema.entity_by_name("Series").unwrap();
    let title = movie.find_scalar_field("title").unwrap();

    let (filter, _) = extract("Production", json!({ "_on": { "Movie": { "title": "Heat" } } }));
    let filter = filter.unwrap();

    assert!(filter.is_narrowing_only());
    assert_eq!(Narrowed::Applies(title.equals("Heat")), filter.clone().narrow_to(&movie));
    assert_eq!(Narrowed::Applies(Filter::Empty), filter.narrow_to(&series));
}

#[test]
fn union_filters_exclude_unlisted_members() {
    let schema = test_schema::movies();
    let genre = schema.entity_by_name("Genre").unwrap();

    let (filter, _) = extract("Search", json!({ "Movie": { "title": "Heat" } }));

    assert_eq!(Narrowed::Excluded, filter.unwrap().narrow_to(&genre));

    let (filter, _) = extract("Search", json!({ "Series": {} }));

    assert_eq!(
        CompileError::from(InputValidationError::UnknownFilter {
            container: "Search".to_owned(),
            key: "Series".to_owned(),
        }),
        filter.unwrap_err()
    );
}

#[test]
fn aggregations_filter_on_count_only() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let actors = movie.find_relation_field("actors").unwrap();

    let (filter, _) = extract("Movie", json!({ "actorsAggregate": { "count_GT": 2 } }));

    assert_eq!(
        Filter::from(AggregationFilter {
            field: actors,
            comparison: CountComparison::GreaterThan,
            value: GraphValue::Int(2),
        }),
        filter.unwrap()
    );

    let (filter, _) = extract("Movie", json!({ "actorsAggregate": { "node": { "name_SHORTEST_EQUAL": 3 } } }));

    assert!(matches!(
        filter.unwrap_err(),
        CompileError::Input(InputValidationError::Unsupported { .. })
    ));
}

#[test]
fn connection_where_combines_node_and_edge() {
    let schema = test_schema::movies();
    let movie = schema.entity_by_name("Movie").unwrap();
    let actor = schema.entity_by_name("Actor").unwrap();
    let actors = movie.find_relation_field("actors").unwrap();
    let acted_in = schema.relationship_properties_by_name("ActedIn").unwrap();

    let config = CompilerConfig::default();
    let request = RequestContext::anonymous();
    let mut session = Session::new(&schema, &config, &SchemaAuthorization, &request);

    let map = input(json!({ "node": { "name": "Keanu Reeves" }, "edge": { "role": "Neo" } }));
    let filter = extract_connection_where(&mut session, map, &actors).unwrap();

    assert_eq!(
        EdgeFilter::And(vec![
            EdgeFilter::Node(actor.find_scalar_field("name").unwrap().equals("Keanu Reeves")),
            EdgeFilter::Edge(acted_in.find_scalar_field("role").unwrap().equals("Neo")),
        ]),
        filter
    );
}

#[test]
fn rule_filters_read_claims() {
    let schema = test_schema::movies();
    let post = schema.entity_by_name("Post").unwrap();
    let config = CompilerConfig::default();
    let request = RequestContext::anonymous();
    let mut session = Session::new(&schema, &config, &SchemaAuthorization, &request);

    let filter = extract_rule_filter(&mut session, input(json!({ "content": "$jwt.sub" })), &post).unwrap();

    let Filter::Scalar(ScalarFilter { condition, .. }) = filter else {
        panic!("expected a scalar filter, got {filter:?}");
    };

    assert_eq!(ScalarCondition::Equals(ConditionValue::Claim(vec!["sub".to_owned()])), condition);
}

proptest! {
    #[test]
    fn string_equality_keeps_the_value(title in "\\PC*") {
        let schema = test_schema::movies();
        let movie = schema.entity_by_name("Movie").unwrap();
        let field = movie.find_scalar_field("title").unwrap();

        let (filter, _) = extract("Movie", json!({ "title": title.clone() }));

        prop_assert_eq!(field.equals(GraphValue::String(title)), filter.unwrap());
    }

    #[test]
    fn nested_empty_groups_vanish(depth in 0usize..6) {
        let mut value = json!({});

        for level in 0..depth {
            let key = if level % 2 == 0 { "AND" } else { "OR" };

            let mut group = serde_json::Map::new();
            group.insert(key.to_owned(), json!([value]));
            value = serde_json::Value::Object(group);
        }

        let (filter, _) = extract("Movie", value);

        prop_assert_eq!(Filter::Empty, filter.unwrap());
    }
}
