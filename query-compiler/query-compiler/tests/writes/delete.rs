use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, InputValidationError};

#[test]
fn deletes_remove_the_matched_nodes() {
    let program = compile(json!({
        "operation": "delete",
        "target": "Movie",
        "where": { "title": "Heat" }
    }));

    expect_test::expect![[r#"
        MATCH (this:Movie)
        WHERE this.title = $this_title
        WITH collect(DISTINCT this) AS this_deleted
        CALL {
            WITH this_deleted
            UNWIND this_deleted AS this
            DETACH DELETE this
        }
        RETURN size(this_deleted) AS data"#]]
    .assert_eq(&program.cypher);

    assert_eq!(vec!["data".to_owned()], program.columns);
}

#[test]
fn nested_deletes_run_before_their_parent() {
    let program = compile(json!({
        "operation": "delete",
        "target": "Movie",
        "where": { "title": "Heat" },
        "delete": {
            "actors": [{ "where": { "node": { "name": "Al Pacino" } } }],
            "genres": [{ "where": { "node": { "name": "Crime" } } }]
        }
    }));

    assert_contains(&program.cypher, "MATCH (this)<-[this_actors_delete0_rel:ACTED_IN]-(this_actors_delete0:Actor)");
    assert_before(&program.cypher, "DETACH DELETE this_actors_delete0", "DETACH DELETE this_genres_delete0");
    assert_before(&program.cypher, "DETACH DELETE this_genres_delete0", "UNWIND this_deleted AS this");
}

#[test]
fn nested_deletes_cascade() {
    let program = compile(json!({
        "operation": "delete",
        "target": "Person",
        "where": { "name": "Michael Mann" },
        "delete": {
            "directed": [{
                "where": { "node": { "title": "Heat" } },
                "delete": { "actors": [{ "where": { "node": { "name": "Al Pacino" } } }] }
            }]
        }
    }));

    assert_contains(&program.cypher, "WITH this_directed_delete0");
    assert_before(
        &program.cypher,
        "DETACH DELETE this_directed_delete0_actors_delete0",
        "UNWIND this_directed_delete0_deleted AS this_directed_delete0",
    );
}

#[test]
fn delete_validation_runs_on_the_matched_nodes() {
    let program = compile(json!({ "operation": "delete", "target": "Post", "where": { "id": "p1" } }));

    assert_before(
        &program.cypher,
        "apoc.util.validatePredicate(NOT EXISTS { MATCH (this)<-[:HAS_POST]-(this_creator_some:User)",
        "DETACH DELETE this",
    );
}

#[test]
fn delete_inputs_name_relationships() {
    assert_eq!(
        CompileError::from(InputValidationError::UnknownField {
            container: "Movie.delete".to_owned(),
            field: "budget".to_owned(),
        }),
        compile_err(json!({ "operation": "delete", "target": "Movie", "delete": { "budget": [] } }))
    );

    assert_eq!(
        CompileError::from(InputValidationError::NotARelationship {
            container: "Movie".to_owned(),
            field: "title".to_owned(),
        }),
        compile_err(json!({ "operation": "delete", "target": "Movie", "delete": { "title": [] } }))
    );
}
