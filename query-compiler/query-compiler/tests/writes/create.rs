use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, CompilerConfig, InputValidationError, RequestContext};

#[test]
fn created_nodes_get_generated_and_default_values() {
    let program = compile(json!({
        "operation": "create",
        "target": "Movie",
        "input": [{ "title": "Heat", "released": 1995, "tags": ["crime", "heist"] }],
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_contains(&program.cypher, "CALL {\n    CREATE (this0:Movie)\n    SET this0.title = $this0_title");
    assert_contains(&program.cypher, "this0.releaseYear = $this0_released");
    assert_contains(&program.cypher, "this0.tags = $this0_tags");
    assert_contains(&program.cypher, "this0.id = randomUUID()");
    assert_contains(&program.cypher, "this0.createdAt = datetime()");
    assert_contains(&program.cypher, "this0.updatedAt = datetime()");
    assert_contains(&program.cypher, "this0.views = $this0_views");
    assert_contains(&program.cypher, "RETURN [this0 { .title }] AS data");

    assert_eq!(Some(&GraphValue::Int(1995)), program.params.get("this0_released"));
    assert_eq!(Some(&GraphValue::Int(0)), program.params.get("this0_views"));
    assert_eq!(vec!["data".to_owned()], program.columns);
}

#[test]
fn every_input_is_created_in_its_own_subquery() {
    let program = compile(json!({
        "operation": "create",
        "target": "Genre",
        "input": [{ "name": "Crime" }, { "name": "Drama" }],
        "selection": { "fields": [{ "name": "name" }] }
    }));

    assert_before(&program.cypher, "CREATE (this0:Genre)", "CREATE (this1:Genre)");
    assert_contains(&program.cypher, "RETURN [this0 { .name }, this1 { .name }] AS data");
    assert_eq!(Some(&GraphValue::from("Crime")), program.params.get("this0_name"));
    assert_eq!(Some(&GraphValue::from("Drama")), program.params.get("this1_name"));
}

#[test]
fn temporal_values_are_converted_on_write() {
    let program = compile(json!({
        "operation": "create",
        "target": "Movie",
        "input": [{ "title": "Heat", "releasedAt": "1995-12-15T00:00:00Z" }]
    }));

    assert_contains(&program.cypher, "this0.releasedAt = datetime($this0_releasedAt)");
}

#[test]
fn required_relationships_are_checked_after_the_create() {
    let program = compile(json!({
        "operation": "create",
        "target": "Movie",
        "input": [{ "title": "Heat" }]
    }));

    assert_contains(&program.cypher, "NOT (COUNT { MATCH (this0)<-[:DIRECTED]-(:Person) } = 1)");
    assert_contains(&program.cypher, "RELATIONSHIP_CARDINALITY");

    let unchecked = compile_with(
        &compiler_with(CompilerConfig::builder().validate_cardinality(false).build()),
        json!({ "operation": "create", "target": "Movie", "input": [{ "title": "Heat" }] }),
        &RequestContext::anonymous(),
    );

    assert_not_contains(&unchecked.cypher, "RELATIONSHIP_CARDINALITY");
}

#[test]
fn nested_creates_write_the_node_and_the_edge() {
    let program = compile(json!({
        "operation": "create",
        "target": "Movie",
        "input": [{
            "title": "The Matrix",
            "actors": { "create": [{ "node": { "name": "Keanu Reeves" }, "edge": { "role": "Neo" } }] },
            "director": { "create": { "node": { "name": "Lana Wachowski" } } }
        }],
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_contains(&program.cypher, "WITH this0");
    assert_contains(&program.cypher, "CREATE (this0_actors0:Actor)");
    assert_contains(&program.cypher, "SET this0_actors0.name = $this0_actors0_name");
    assert_contains(&program.cypher, "CREATE (this0)<-[this0_actors0_rel:ACTED_IN]-(this0_actors0)");
    assert_contains(&program.cypher, "SET this0_actors0_rel.role = $this0_actors0_rel_role");
    assert_contains(&program.cypher, "CREATE (this0_director0:Person)");
    assert_before(&program.cypher, "CREATE (this0_actors0:Actor)", "CREATE (this0_director0:Person)");

    assert_eq!(Some(&GraphValue::from("Neo")), program.params.get("this0_actors0_rel_role"));
}

#[test]
fn nested_creates_on_interfaces_name_the_type() {
    let program = compile(json!({
        "operation": "create",
        "target": "Actor",
        "input": [{
            "name": "Al Pacino",
            "actedIn": { "create": [{ "node": { "Movie": { "title": "Heat" } } }] }
        }]
    }));

    assert_contains(&program.cypher, "CREATE (this0_actedIn0:Movie)");
    assert_contains(&program.cypher, "CREATE (this0)-[this0_actedIn0_rel:ACTED_IN]->(this0_actedIn0)");
}

#[test]
fn invalid_creates_are_rejected() {
    assert_eq!(
        CompileError::from(InputValidationError::MissingRequiredField {
            container: "Movie".to_owned(),
            field: "title".to_owned(),
        }),
        compile_err(json!({ "operation": "create", "target": "Movie", "input": [{ "released": 1995 }] }))
    );

    assert!(matches!(
        compile_err(json!({ "operation": "create", "target": "Movie", "input": [{ "title": "Heat", "score": 4.5 }] })),
        CompileError::Input(InputValidationError::Unsupported { .. })
    ));

    assert!(matches!(
        compile_err(json!({ "operation": "create", "target": "Movie", "input": [{ "title": "Heat", "views_INCREMENT": 1 }] })),
        CompileError::Input(InputValidationError::InvalidOperator { .. })
    ));

    assert!(matches!(
        compile_err(json!({
            "operation": "create",
            "target": "Post",
            "input": [{ "creator": { "create": { "node": { "name": "Ann" } } } }]
        })),
        CompileError::Input(InputValidationError::DisallowedNestedOperation { .. })
    ));
}
