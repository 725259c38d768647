use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompilerConfig, RequestContext};

fn compile_with_events(value: serde_json::Value) -> query_compiler::Program {
    let compiler = compiler_with(CompilerConfig::builder().events(true).build());
    compile_with(&compiler, value, &RequestContext::anonymous())
}

#[test]
fn events_are_returned_in_a_meta_column() {
    let program = compile_with_events(json!({
        "operation": "create",
        "target": "Genre",
        "input": [{ "name": "Noir" }],
        "selection": { "fields": [{ "name": "name" }] }
    }));

    assert_eq!(vec!["data".to_owned(), "meta".to_owned()], program.columns);
    assert_contains(&program.cypher, "event: \"create\"");
    assert_contains(&program.cypher, "typename: \"Genre\"");
    assert_contains(&program.cypher, "AS this0_meta");
    assert_contains(&program.cypher, "AS meta");
}

#[test]
fn no_events_without_the_switch() {
    let program = compile(json!({
        "operation": "create",
        "target": "Genre",
        "input": [{ "name": "Noir" }]
    }));

    assert_eq!(vec!["data".to_owned()], program.columns);
    assert_not_contains(&program.cypher, "event:");
    assert_not_contains(&program.cypher, "meta");
}

#[test]
fn nested_steps_contribute_their_events() {
    let program = compile_with_events(json!({
        "operation": "create",
        "target": "Movie",
        "input": [{
            "title": "Heat",
            "actors": { "create": [{ "node": { "name": "Al Pacino" } }] },
            "genres": { "connect": [{ "where": { "node": { "name": "Crime" } } }] }
        }]
    }));

    assert_contains(&program.cypher, "event: \"create_relationship\"");
    assert_contains(&program.cypher, "relationshipName: \"ACTED_IN\"");
    assert_contains(&program.cypher, "relationshipName: \"IN_GENRE\"");
    assert_contains(&program.cypher, "this0_actors0_meta");
    assert_contains(&program.cypher, "this0_genres_connect0_meta");
}

#[test]
fn updates_report_old_and_new_properties() {
    let program = compile_with_events(json!({
        "operation": "update",
        "target": "Genre",
        "where": { "name": "Noir" },
        "update": { "name": "Neo-noir" }
    }));

    assert_contains(&program.cypher, "event: \"update\"");
    assert_contains(&program.cypher, "this { .* }");
    assert_eq!(vec!["data".to_owned(), "meta".to_owned()], program.columns);
}

#[test]
fn deletes_and_disconnects_report_what_they_removed() {
    let deleted = compile_with_events(json!({
        "operation": "delete",
        "target": "Genre",
        "where": { "name": "Noir" }
    }));

    assert_contains(&deleted.cypher, "event: \"delete\"");
    assert_contains(&deleted.cypher, "RETURN size(this_deleted) AS data, meta");

    let disconnected = compile_with_events(json!({
        "operation": "update",
        "target": "Movie",
        "update": { "genres": { "disconnect": [{ "where": { "node": { "name": "Noir" } } }] } }
    }));

    assert_contains(&disconnected.cypher, "event: \"delete_relationship\"");
    assert_before(
        &disconnected.cypher,
        "AS this_genres_disconnect0_disconnected",
        "DELETE this_genres_disconnect0_rel",
    );
}
