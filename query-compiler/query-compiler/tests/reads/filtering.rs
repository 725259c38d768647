use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, CompilerConfig, DiagnosticKind, InputValidationError, RequestContext};

fn read_movies(filter: serde_json::Value) -> query_compiler::Program {
    compile(json!({
        "operation": "read",
        "target": "Movie",
        "where": filter,
        "selection": { "fields": [{ "name": "title" }] }
    }))
}

#[test]
fn boolean_groups_nest() {
    let program = read_movies(json!({
        "OR": [{ "title_CONTAINS": "Heat" }, { "released_GTE": 1990, "views_LT": 100 }],
        "NOT": { "tags_INCLUDES": "noir" }
    }));

    assert_contains(
        &program.cypher,
        "WHERE (this.title CONTAINS $this_title OR (this.releaseYear >= $this_released AND this.views < $this_views)) AND NOT ($this_tags IN this.tags)",
    );
}

#[test]
fn temporal_and_list_values_are_converted() {
    let program = read_movies(json!({ "releasedAt_IN": ["2020-01-01T00:00:00Z", "2021-01-01T00:00:00Z"] }));

    assert_contains(&program.cypher, "this.releasedAt IN [");
    assert_contains(&program.cypher, "datetime(");
    assert_eq!(
        Some(&GraphValue::List(vec![
            GraphValue::from("2020-01-01T00:00:00Z"),
            GraphValue::from("2021-01-01T00:00:00Z"),
        ])),
        program.params.get("this_releasedAt")
    );
}

#[test]
fn null_means_absent() {
    let program = read_movies(json!({ "released": null }));

    assert_contains(&program.cypher, "WHERE this.releaseYear IS NULL");
    assert!(!program.params.contains_key("this_released"));
}

#[test]
fn relationship_quantifiers_become_subqueries() {
    let some = read_movies(json!({ "actors_SOME": { "name": "Keanu Reeves" } }));
    assert_contains(
        &some.cypher,
        "WHERE EXISTS { MATCH (this)<-[:ACTED_IN]-(this_actors_some:Actor) WHERE this_actors_some.name = $this_actors_some_name }",
    );

    let none = read_movies(json!({ "actors_NONE": { "name": "Keanu Reeves" } }));
    assert_contains(&none.cypher, "WHERE NOT EXISTS { MATCH (this)<-[:ACTED_IN]-(this_actors_none:Actor)");

    let single = read_movies(json!({ "actors_SINGLE": { "name": "Keanu Reeves" } }));
    assert_contains(&single.cypher, "COUNT { MATCH (this)<-[:ACTED_IN]-(this_actors_single:Actor)");
    assert_contains(&single.cypher, "} = 1");
}

#[test]
fn connections_filter_on_the_edge() {
    let program = read_movies(json!({
        "actorsConnection_SOME": { "node": { "name": "Keanu Reeves" }, "edge": { "role": "Neo" } }
    }));

    assert_contains(
        &program.cypher,
        "EXISTS { MATCH (this)<-[this_actorsConnection_some_rel:ACTED_IN]-(this_actorsConnection_some:Actor)",
    );
    assert_contains(&program.cypher, "this_actorsConnection_some_rel.role = $");
    assert_contains(&program.cypher, "this_actorsConnection_some.name = $");
}

#[test]
fn aggregations_count_the_related_nodes() {
    let program = read_movies(json!({ "actorsAggregate": { "count_GT": 2 } }));

    assert_contains(
        &program.cypher,
        "WHERE COUNT { MATCH (this)<-[:ACTED_IN]-(:Actor) } > $this_actorsAggregate_count",
    );
    assert_eq!(Some(&GraphValue::Int(2)), program.params.get("this_actorsAggregate_count"));
}

#[test]
fn deprecated_forms_are_reported_once() {
    let program = read_movies(json!({
        "title_NOT": "Heat",
        "OR": [{ "title_NOT": "Ronin" }],
        "actors": { "name": "Robert De Niro" }
    }));

    assert_eq!(2, program.diagnostics.len());
    assert!(program.diagnostics.iter().all(|d| d.kind == DiagnosticKind::Deprecation));
    assert_eq!(
        "`Movie.title_NOT` is deprecated, use `NOT: { title }` instead.",
        program.diagnostics[0].message
    );
}

#[test]
fn deprecation_warnings_can_be_switched_off() {
    let compiler = compiler_with(CompilerConfig::builder().deprecation_warnings(false).build());
    let program = compile_with(
        &compiler,
        json!({ "operation": "read", "target": "Movie", "where": { "title_NOT": "Heat" } }),
        &RequestContext::anonymous(),
    );

    assert!(program.diagnostics.is_empty());
    assert_contains(&program.cypher, "WHERE NOT (this.title = $this_title)");
}

#[test]
fn filters_must_fit_the_schema() {
    assert_eq!(
        CompileError::from(InputValidationError::UnknownFilter {
            container: "Movie".to_owned(),
            key: "budget_GT".to_owned(),
        }),
        compile_err(json!({ "operation": "read", "target": "Movie", "where": { "budget_GT": 1 } }))
    );

    assert!(matches!(
        compile_err(json!({ "operation": "read", "target": "Movie", "where": { "released": "ninety" } })),
        CompileError::Input(InputValidationError::InvalidValue { .. })
    ));

    assert!(matches!(
        compile_err(json!({ "operation": "read", "target": "Movie", "where": { "director_ALL": {} } })),
        CompileError::Input(InputValidationError::InvalidOperator { .. })
    ));
}
