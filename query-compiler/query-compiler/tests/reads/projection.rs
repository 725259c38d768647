use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, InputValidationError};

#[test]
fn selected_fields_become_a_map_projection() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "where": { "title": "Heat" },
        "selection": { "fields": [{ "name": "title" }, { "name": "released" }] }
    }));

    expect_test::expect![[r#"
        MATCH (this:Movie)
        WHERE this.title = $this_title
        RETURN this { .title, released: this.releaseYear } AS this"#]]
    .assert_eq(&program.cypher);

    assert_eq!(Some(&GraphValue::from("Heat")), program.params.get("this_title"));
    assert_eq!(vec!["this".to_owned()], program.columns);
    assert!(program.diagnostics.is_empty());
}

#[test]
fn aliases_and_defaults_are_entries() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": { "fields": [{ "name": "title", "alias": "name" }, { "name": "rating" }] }
    }));

    assert_contains(&program.cypher, "name: this.title");
    assert_contains(&program.cypher, "rating: coalesce(this.rating, $this_rating_default)");
    assert_eq!(Some(&GraphValue::Float(0.5)), program.params.get("this_rating_default"));
}

#[test]
fn relationships_are_read_in_subqueries() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": {
            "fields": [
                { "name": "title" },
                {
                    "name": "actors",
                    "arguments": { "where": { "name_STARTS_WITH": "K" } },
                    "selection": { "fields": [{ "name": "name" }] }
                }
            ]
        }
    }));

    assert_contains(&program.cypher, "MATCH (this)<-[:ACTED_IN]-(this_actors:Actor)");
    assert_contains(&program.cypher, "WHERE this_actors.name STARTS WITH $this_actors_name");
    assert_contains(&program.cypher, "RETURN collect(this_actors { .name }) AS this_actors");
    assert_contains(&program.cypher, "RETURN this { .title, actors: this_actors } AS this");
    assert_eq!(Some(&GraphValue::from("K")), program.params.get("this_actors_name"));
}

#[test]
fn undirected_reads_need_the_field_to_allow_them() {
    let genres = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": {
            "fields": [{
                "name": "genres",
                "arguments": { "directed": false },
                "selection": { "fields": [{ "name": "name" }] }
            }]
        }
    }));

    assert_contains(&genres.cypher, "MATCH (this)-[:IN_GENRE]-(this_genres:Genre)");

    let actors = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": {
            "fields": [{
                "name": "actors",
                "arguments": { "directed": false },
                "selection": { "fields": [{ "name": "name" }] }
            }]
        }
    }));

    assert_contains(&actors.cypher, "MATCH (this)<-[:ACTED_IN]-(this_actors:Actor)");
}

#[test]
fn sorting_and_pagination_follow_the_match() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "options": { "sort": [{ "title": "DESC" }], "limit": 5, "offset": 10 },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    expect_test::expect![[r#"
        MATCH (this:Movie)
        WITH *
        ORDER BY this.title DESC
        SKIP $this_offset
        LIMIT $this_limit
        RETURN this { .title } AS this"#]]
    .assert_eq(&program.cypher);

    assert_eq!(Some(&GraphValue::Int(5)), program.params.get("this_limit"));
    assert_eq!(Some(&GraphValue::Int(10)), program.params.get("this_offset"));
}

#[test]
fn type_limits_apply_to_reads() {
    let defaulted = compile(json!({
        "operation": "read",
        "target": "Series",
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_contains(&defaulted.cypher, "LIMIT $this_limit");
    assert_eq!(Some(&GraphValue::Int(10)), defaulted.params.get("this_limit"));

    let capped = compile(json!({
        "operation": "read",
        "target": "Series",
        "options": { "limit": 500 },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_eq!(Some(&GraphValue::Int(50)), capped.params.get("this_limit"));
}

#[test]
fn computed_sort_keys_are_evaluated_before_the_limit() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "options": { "sort": [{ "score": "DESC" }], "limit": 3 },
        "selection": { "fields": [{ "name": "title" }, { "name": "score" }] }
    }));

    assert_before(&program.cypher, "MATCH (this)<-[r:REVIEWED]-() RETURN avg(r.score) AS score", "ORDER BY");
    assert_contains(&program.cypher, "ORDER BY this_score DESC");

    // Evaluated once, reused by the projection.
    assert_eq!(1, program.cypher.matches("avg(r.score)").count());
}

#[test]
fn other_computed_fields_run_after_the_limit() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "options": { "limit": 3 },
        "selection": { "fields": [{ "name": "score" }] }
    }));

    assert_before(&program.cypher, "LIMIT $this_limit", "avg(r.score)");
    assert_contains(&program.cypher, "RETURN this { score: this_score } AS this");
}

#[test]
fn custom_resolvers_read_their_requirements() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": { "fields": [{ "name": "summary" }] }
    }));

    assert_contains(&program.cypher, "RETURN this { .title, released: this.releaseYear } AS this");
}

#[test]
fn invalid_reads_are_rejected() {
    assert_eq!(
        CompileError::from(InputValidationError::UnknownType {
            name: "Documentary".to_owned()
        }),
        compile_err(json!({ "operation": "read", "target": "Documentary" }))
    );

    assert_eq!(
        CompileError::from(InputValidationError::InvalidSortDirection {
            field: "Movie.title".to_owned(),
            direction: "UP".to_owned(),
        }),
        compile_err(json!({
            "operation": "read",
            "target": "Movie",
            "options": { "sort": [{ "title": "UP" }] }
        }))
    );

    assert_eq!(
        CompileError::from(InputValidationError::InvalidSortField {
            field: "Movie.tags".to_owned()
        }),
        compile_err(json!({
            "operation": "read",
            "target": "Movie",
            "options": { "sort": [{ "tags": "ASC" }] }
        }))
    );
}

#[test]
fn compiling_twice_gives_the_same_program() {
    let read = json!({
        "operation": "read",
        "target": "Movie",
        "where": { "OR": [{ "title_CONTAINS": "Heat" }, { "released_GT": 1990 }] },
        "options": { "sort": [{ "released": "ASC" }], "limit": 10 },
        "selection": {
            "fields": [
                { "name": "title" },
                { "name": "actors", "selection": { "fields": [{ "name": "name" }] } },
                { "name": "score" }
            ]
        }
    });

    let compiler = compiler();
    let request = query_compiler::RequestContext::anonymous();

    assert_eq!(
        compile_with(&compiler, read.clone(), &request),
        compile_with(&compiler, read, &request)
    );
}
