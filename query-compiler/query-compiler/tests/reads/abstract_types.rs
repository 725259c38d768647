use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, InputValidationError};

#[test]
fn interfaces_read_every_implementation() {
    let program = compile(json!({
        "operation": "read",
        "target": "Production",
        "selection": {
            "fields": [{ "name": "title" }],
            "on": { "Movie": [{ "name": "released" }] }
        }
    }));

    assert_contains(&program.cypher, "MATCH (this:Movie)");
    assert_contains(&program.cypher, "MATCH (this:Series)");
    assert_contains(&program.cypher, "UNION");
    assert_contains(&program.cypher, "released: this.releaseYear");
    assert_contains(&program.cypher, "__typename: \"Movie\"");
    assert_contains(&program.cypher, "__typename: \"Series\"");
    assert_eq!(vec!["this".to_owned()], program.columns);
}

#[test]
fn abstract_reads_sort_the_combined_maps() {
    let program = compile(json!({
        "operation": "read",
        "target": "Production",
        "options": { "sort": [{ "title": "ASC" }], "limit": 2 },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_before(&program.cypher, "UNION", "ORDER BY this.title ASC");
    assert_contains(&program.cypher, "LIMIT $this_limit");
}

#[test]
fn pages_of_abstract_reads_are_projected_after_the_limit() {
    let program = compile(json!({
        "operation": "read",
        "target": "Production",
        "options": { "sort": [{ "title": "ASC" }], "limit": 1 },
        "selection": {
            "fields": [{ "name": "title" }],
            "on": { "Movie": [{ "name": "score" }] }
        }
    }));

    assert_contains(&program.cypher, "RETURN this, this { .title } AS this_sort");
    assert_contains(&program.cypher, "ORDER BY this_sort.title ASC");
    assert_before(&program.cypher, "LIMIT $this_limit", "MATCH (this)<-[r:REVIEWED]-()");
    assert_before(&program.cypher, "LIMIT $this_limit", "AS this_score");
    assert_contains(&program.cypher, "WHERE this:Movie");
    assert_contains(&program.cypher, "WHERE this:Series");
    assert_contains(&program.cypher, "score: this_score");
    assert_contains(&program.cypher, "RETURN this_item AS this");
    assert_eq!(1, program.cypher.matches("MATCH (this)<-[r:REVIEWED]-()").count());
    assert_eq!(vec!["this".to_owned()], program.columns);
}

#[test]
fn related_abstract_pages_are_projected_after_the_limit() {
    let program = compile(json!({
        "operation": "read",
        "target": "User",
        "selection": {
            "fields": [{
                "name": "favorites",
                "arguments": { "options": { "limit": 1 } },
                "selection": { "on": { "Movie": [{ "name": "score" }], "Genre": [{ "name": "name" }] } }
            }]
        }
    }));

    assert_before(&program.cypher, "LIMIT $this_favorites_limit", "AS this_favorites_score");
    assert_contains(&program.cypher, "WHERE this_favorites:Genre");
    assert_contains(&program.cypher, "RETURN collect(this_favorites_item) AS this_favorites");
}

#[test]
fn stored_fields_are_projected_before_sorting() {
    let program = compile(json!({
        "operation": "read",
        "target": "Production",
        "options": { "limit": 1 },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_not_contains(&program.cypher, "this_sort");
    assert_not_contains(&program.cypher, "this_item");
}

#[test]
fn narrowed_filters_only_restrict_their_type() {
    let program = compile(json!({
        "operation": "read",
        "target": "Production",
        "where": { "_on": { "Movie": { "title": "Heat" } } },
        "selection": { "fields": [{ "name": "title" }] }
    }));

    assert_contains(&program.cypher, "MATCH (this:Movie)\n    WHERE this.title = $this_title");
    assert_contains(&program.cypher, "MATCH (this:Series)\n    RETURN");
}

#[test]
fn union_filters_drop_unlisted_members() {
    let program = compile(json!({
        "operation": "read",
        "target": "Search",
        "where": { "Movie": { "title": "Heat" } },
        "selection": { "on": { "Movie": [{ "name": "title" }], "Genre": [{ "name": "name" }] } }
    }));

    assert_contains(&program.cypher, "MATCH (this:Movie)");
    assert_not_contains(&program.cypher, "(this:Genre)");
}

#[test]
fn union_members_are_selected_by_type() {
    let program = compile(json!({
        "operation": "read",
        "target": "User",
        "selection": {
            "fields": [{
                "name": "favorites",
                "selection": { "on": { "Movie": [{ "name": "title" }], "Genre": [{ "name": "name" }] } }
            }]
        }
    }));

    assert_contains(&program.cypher, "MATCH (this)-[:LIKES]->(this_favorites:Movie)");
    assert_contains(&program.cypher, "MATCH (this)-[:LIKES]->(this_favorites:Genre)");
    assert_contains(&program.cypher, "__typename: \"Genre\"");
    assert_contains(&program.cypher, "favorites: this_favorites");
}

#[test]
fn unions_cannot_be_sorted() {
    let err = compile_err(json!({
        "operation": "read",
        "target": "Search",
        "options": { "sort": [{ "title": "ASC" }] }
    }));

    assert!(matches!(err, CompileError::Input(InputValidationError::Unsupported { .. })));
}

#[test]
fn writes_need_a_concrete_type() {
    let err = compile_err(json!({
        "operation": "create",
        "target": "Production",
        "input": [{ "title": "Heat" }]
    }));

    assert!(matches!(err, CompileError::Input(InputValidationError::Unsupported { .. })));
}
