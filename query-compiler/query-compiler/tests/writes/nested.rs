use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{AuthorizationProvider, CompileError, InputValidationError, RequestContext};
use query_structure::{
    AuthorizationOperation, AuthorizationRule, Entity, RuleKind, ValidationWhen, definition::AuthorizationWhere,
};

fn update_movie(update: serde_json::Value) -> query_compiler::Program {
    compile(json!({
        "operation": "update",
        "target": "Movie",
        "where": { "title": "The Matrix" },
        "update": update,
        "selection": { "fields": [{ "name": "title" }] }
    }))
}

#[test]
fn connects_merge_the_relationship_by_default() {
    let program = update_movie(json!({
        "actors": {
            "connect": [{ "where": { "node": { "name": "Keanu Reeves" } }, "edge": { "role": "Neo" } }]
        }
    }));

    assert_contains(&program.cypher, "OPTIONAL MATCH (this_actors_connect0:Actor)");
    assert_contains(&program.cypher, "WHERE this_actors_connect0.name = $this_actors_connect0_name");
    assert_contains(
        &program.cypher,
        "WITH this, collect(DISTINCT this_actors_connect0) AS this_actors_connect0_nodes",
    );
    assert_contains(&program.cypher, "UNWIND this_actors_connect0_nodes AS this_actors_connect0");
    assert_contains(&program.cypher, "MERGE (this)<-[this_actors_connect0_rel:ACTED_IN]-(this_actors_connect0)");
    assert_contains(&program.cypher, "SET this_actors_connect0_rel.role = $this_actors_connect0_rel_role");
}

#[test]
fn duplicate_relationships_are_always_created() {
    let program = update_movie(json!({
        "reviewers": {
            "connect": [{ "where": { "node": { "name": "Ann" } }, "edge": { "score": 8 } }]
        }
    }));

    assert_contains(&program.cypher, "CREATE (this)<-[this_reviewers_connect0_rel:REVIEWED]-(this_reviewers_connect0)");
    assert_contains(&program.cypher, "this_reviewers_connect0_rel.score = $this_reviewers_connect0_rel_score");
    assert_contains(&program.cypher, "this_reviewers_connect0_rel.createdAt = datetime()");
    assert_not_contains(&program.cypher, "MERGE (this)<-[this_reviewers_connect0_rel");
}

#[test]
fn overwrite_picks_the_policy_of_one_entry() {
    let program = update_movie(json!({
        "actors": {
            "connect": [
                { "where": { "node": { "name": "Keanu Reeves" } }, "overwrite": false },
                { "where": { "node": { "name": "Carrie-Anne Moss" } } }
            ]
        }
    }));

    assert_contains(&program.cypher, "CREATE (this)<-[this_actors_connect0_rel:ACTED_IN]-(this_actors_connect0)");
    assert_contains(&program.cypher, "MERGE (this)<-[this_actors_connect1_rel:ACTED_IN]-(this_actors_connect1)");
}

#[test]
fn entries_are_independent_subqueries() {
    let program = update_movie(json!({
        "actors": {
            "connect": [
                { "where": { "node": { "name": "Keanu Reeves" } } },
                { "where": { "node": { "name": "Laurence Fishburne" } } }
            ]
        }
    }));

    assert_eq!(2, program.cypher.matches("OPTIONAL MATCH").count());
    assert_before(&program.cypher, "this_actors_connect0_name", "this_actors_connect1_name");
    assert_eq!(Some(&GraphValue::from("Keanu Reeves")), program.params.get("this_actors_connect0_name"));
    assert_eq!(
        Some(&GraphValue::from("Laurence Fishburne")),
        program.params.get("this_actors_connect1_name")
    );
}

#[test]
fn required_edge_properties_must_be_given() {
    let err = compile_err(json!({
        "operation": "update",
        "target": "Movie",
        "update": { "reviewers": { "connect": [{ "where": { "node": { "name": "Ann" } } }] } }
    }));

    assert_eq!(
        CompileError::from(InputValidationError::MissingRequiredField {
            container: "Review".to_owned(),
            field: "score".to_owned(),
        }),
        err
    );
}

#[test]
fn connects_continue_on_the_connected_nodes() {
    let program = update_movie(json!({
        "actors": {
            "connect": [{
                "where": { "node": { "name": "Keanu Reeves" } },
                "connect": { "actedIn": [{ "where": { "node": { "title": "John Wick" } } }] }
            }]
        }
    }));

    assert_contains(&program.cypher, "WITH this_actors_connect0");
    assert_contains(&program.cypher, "OPTIONAL MATCH (this_actors_connect0_actedIn_connect0_Movie:Movie)");
    assert_contains(&program.cypher, "OPTIONAL MATCH (this_actors_connect0_actedIn_connect0_Series:Series)");
}

#[test]
fn narrowed_connects_skip_unlisted_types() {
    let program = compile(json!({
        "operation": "update",
        "target": "Actor",
        "update": {
            "actedIn": { "connect": [{ "where": { "node": { "_on": { "Movie": { "title": "Heat" } } } } }] }
        }
    }));

    assert_contains(&program.cypher, "OPTIONAL MATCH (this_actedIn_connect0_Movie:Movie)");
    assert_not_contains(&program.cypher, ":Series)");
}

#[test]
fn disconnects_delete_the_relationship() {
    let program = update_movie(json!({
        "actors": {
            "disconnect": [{ "where": { "node": { "name": "Keanu Reeves" }, "edge": { "role": "Neo" } } }]
        }
    }));

    assert_contains(
        &program.cypher,
        "MATCH (this)<-[this_actors_disconnect0_rel:ACTED_IN]-(this_actors_disconnect0:Actor)",
    );
    assert_contains(&program.cypher, "this_actors_disconnect0_rel.role = $this_actors_disconnect0_rel_role");
    assert_contains(&program.cypher, "DELETE this_actors_disconnect0_rel");
    assert_not_contains(&program.cypher, "DETACH DELETE this_actors_disconnect0");
}

#[test]
fn connect_or_create_merges_on_unique_properties() {
    let program = update_movie(json!({
        "genres": {
            "connectOrCreate": [{
                "where": { "node": { "name": "Sci-Fi" } },
                "onCreate": { "node": { "name": "Sci-Fi" } }
            }]
        }
    }));

    assert_contains(&program.cypher, "MERGE (this_genres_connectOrCreate0:Genre");
    assert_contains(&program.cypher, "$this_genres_connectOrCreate0_name");
    assert_contains(
        &program.cypher,
        "MERGE (this)-[this_genres_connectOrCreate0_rel:IN_GENRE]->(this_genres_connectOrCreate0)",
    );
    assert_not_contains(&program.cypher, "SET this_genres_connectOrCreate0.name");
    assert_eq!(
        Some(&GraphValue::from("Sci-Fi")),
        program.params.get("this_genres_connectOrCreate0_name")
    );
}

#[test]
fn connect_or_create_needs_unique_fields() {
    let err = compile_err(json!({
        "operation": "update",
        "target": "Movie",
        "update": {
            "actors": { "connectOrCreate": [{ "where": { "node": { "born": 1964 } } }] }
        }
    }));

    assert!(matches!(err, CompileError::Input(InputValidationError::Unsupported { .. })));

    let err = compile_err(json!({
        "operation": "update",
        "target": "Movie",
        "update": { "genres": { "connectOrCreate": [{ "onCreate": { "node": { "name": "Drama" } } }] } }
    }));

    assert!(matches!(err, CompileError::Input(InputValidationError::MissingRequiredField { .. })));
}

#[test]
fn nested_deletes_run_inside_the_update() {
    let program = update_movie(json!({
        "actors": { "delete": [{ "where": { "node": { "name": "Keanu Reeves" } } }] }
    }));

    assert_contains(&program.cypher, "MATCH (this)<-[this_actors_delete0_rel:ACTED_IN]-(this_actors_delete0:Actor)");
    assert_contains(&program.cypher, "WITH collect(DISTINCT this_actors_delete0) AS this_actors_delete0_deleted");
    assert_contains(&program.cypher, "DETACH DELETE this_actors_delete0");
}

#[test]
fn nested_operations_follow_the_input_order() {
    let program = update_movie(json!({
        "actors": [
            { "disconnect": [{ "where": { "node": { "name": "A" } } }] },
            { "connect": [{ "where": { "node": { "name": "B" } } }] }
        ],
        "genres": { "create": [{ "node": { "name": "Noir" } }] }
    }));

    assert_before(&program.cypher, "DELETE this_actors_disconnect0_rel", "OPTIONAL MATCH (this_actors_connect0:Actor)");
    assert_before(&program.cypher, "OPTIONAL MATCH (this_actors_connect0:Actor)", "CREATE (this_genres0:Genre)");
}

#[test]
fn disallowed_operations_are_rejected() {
    let err = compile_err(json!({
        "operation": "update",
        "target": "Post",
        "update": { "creator": { "disconnect": {} } }
    }));

    assert_eq!(
        CompileError::from(InputValidationError::DisallowedNestedOperation {
            field: "Post.creator".to_owned(),
            operation: "disconnect".to_owned(),
        }),
        err
    );
}

/// Genres are connectable by name only, movies only when they are "The Matrix".
struct GuardedGenres;

impl AuthorizationProvider for GuardedGenres {
    fn rules(&self, entity: &Entity, operation: AuthorizationOperation) -> Vec<AuthorizationRule> {
        let rule = |kind, when, node: serde_json::Value| AuthorizationRule {
            kind,
            operations: vec![AuthorizationOperation::Connect],
            when,
            requires_authentication: false,
            filter: AuthorizationWhere {
                node: node.as_object().cloned(),
                jwt: None,
            },
        };

        match (entity.name(), operation) {
            ("Genre", AuthorizationOperation::Connect) => {
                vec![rule(RuleKind::Filter, Vec::new(), json!({ "name": "Sci-Fi" }))]
            }
            ("Movie", AuthorizationOperation::Connect) => vec![rule(
                RuleKind::Validate,
                vec![ValidationWhen::Before],
                json!({ "title": "The Matrix" }),
            )],
            _ => Vec::new(),
        }
    }
}

fn update_genres(compiler: &query_compiler::QueryCompiler, genres: serde_json::Value) -> query_compiler::Program {
    compile_with(
        compiler,
        json!({
            "operation": "update",
            "target": "Movie",
            "update": { "genres": genres }
        }),
        &RequestContext::anonymous(),
    )
}

#[test]
fn connect_or_create_applies_the_rules_of_both_nodes() {
    let compiler = compiler().with_authorization(GuardedGenres);
    let program = update_genres(
        &compiler,
        json!({
            "connectOrCreate": [{
                "where": { "node": { "name": "Sci-Fi" } },
                "onCreate": { "node": { "name": "Sci-Fi" } }
            }]
        }),
    );

    assert_contains(&program.cypher, "WITH *\n    WHERE ");
    assert_before(
        &program.cypher,
        "MERGE (this_genres_connectOrCreate0:Genre",
        "apoc.util.validatePredicate(NOT (this.title = $",
    );
    assert_before(
        &program.cypher,
        "apoc.util.validatePredicate(NOT (this.title = $",
        "MERGE (this)-[this_genres_connectOrCreate0_rel:IN_GENRE]->(this_genres_connectOrCreate0)",
    );
    assert_before(
        &program.cypher,
        "this_genres_connectOrCreate0.name = $",
        "MERGE (this)-[this_genres_connectOrCreate0_rel:IN_GENRE]->(this_genres_connectOrCreate0)",
    );

    // Same guards as a plain connect.
    let connected = update_genres(&compiler, json!({ "connect": [{ "where": { "node": { "name": "Sci-Fi" } } }] }));
    assert_contains(&connected.cypher, "apoc.util.validatePredicate(NOT (this.title = $");
}
