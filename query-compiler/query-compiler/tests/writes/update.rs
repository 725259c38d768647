use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, InputValidationError};

#[test]
fn updates_set_the_matched_nodes() {
    let program = compile(json!({
        "operation": "update",
        "target": "Movie",
        "where": { "title": "Heat" },
        "update": { "released": 1995, "views_INCREMENT": 1, "tags_PUSH": "noir" },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_contains(&program.cypher, "MATCH (this:Movie)\nWHERE this.title = $this_title");
    assert_contains(&program.cypher, "SET this.releaseYear = $this_released");
    assert_contains(&program.cypher, "this.views = this.views + $this_views");
    assert_contains(&program.cypher, "this.tags = this.tags + $this_tags");
    assert_contains(&program.cypher, "this.updatedAt = datetime()");
    assert_not_contains(&program.cypher, "this.createdAt =");
    assert_contains(&program.cypher, "RETURN collect(DISTINCT this { .title }) AS data");

    assert_eq!(Some(&GraphValue::Int(1)), program.params.get("this_views"));
    assert_eq!(
        Some(&GraphValue::List(vec![GraphValue::from("noir")])),
        program.params.get("this_tags")
    );
    assert_eq!(vec!["data".to_owned()], program.columns);
}

#[test]
fn nested_updates_match_the_related_nodes() {
    let program = compile(json!({
        "operation": "update",
        "target": "Movie",
        "where": { "title": "The Matrix" },
        "update": {
            "actors": [{
                "where": { "node": { "name": "Keanu Reeves" }, "edge": { "role": "Neo" } },
                "update": { "node": { "born": 1964 }, "edge": { "screenTime": 120 } }
            }]
        }
    }));

    assert_contains(&program.cypher, "MATCH (this)<-[this_actors_update0_rel:ACTED_IN]-(this_actors_update0:Actor)");
    assert_contains(&program.cypher, "this_actors_update0.name = $this_actors_update0_name");
    assert_contains(&program.cypher, "this_actors_update0_rel.role = $this_actors_update0_rel_role");
    assert_contains(&program.cypher, "SET this_actors_update0_rel.screenTime = $this_actors_update0_rel_screenTime");
    assert_contains(&program.cypher, "SET this_actors_update0.born = $this_actors_update0_born");
    assert_eq!(Some(&GraphValue::Int(1964)), program.params.get("this_actors_update0_born"));
}

#[test]
fn touched_relationships_are_checked() {
    let program = compile(json!({
        "operation": "update",
        "target": "Movie",
        "update": {
            "director": { "disconnect": { "where": { "node": { "name": "Michael Mann" } } } }
        }
    }));

    assert_contains(&program.cypher, "DELETE this_director_disconnect0_rel");
    assert_contains(&program.cypher, "NOT (COUNT { MATCH (this)<-[:DIRECTED]-(:Person) } = 1)");

    let untouched = compile(json!({
        "operation": "update",
        "target": "Movie",
        "update": { "title": "Heat" }
    }));

    assert_not_contains(&untouched.cypher, "RELATIONSHIP_CARDINALITY");
}

#[test]
fn invalid_updates_are_rejected() {
    assert!(matches!(
        compile_err(json!({
            "operation": "update",
            "target": "Movie",
            "update": { "views": 1, "views_INCREMENT": 1 }
        })),
        CompileError::Input(InputValidationError::Unsupported { .. })
    ));

    assert!(matches!(
        compile_err(json!({ "operation": "update", "target": "Movie", "update": { "title_INCREMENT": 1 } })),
        CompileError::Input(InputValidationError::InvalidOperator { .. })
    ));

    assert_eq!(
        CompileError::from(InputValidationError::ExpectedSingle {
            field: "Movie.director".to_owned()
        }),
        compile_err(json!({
            "operation": "update",
            "target": "Movie",
            "update": { "director": [{ "connect": { "where": { "node": { "name": "A" } } } }, {}] }
        }))
    );
}
