use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{CompileError, InputValidationError};

#[test]
fn counts_are_merged_into_one_map() {
    let program = compile(json!({
        "operation": "aggregate",
        "target": "Movie",
        "where": { "released_GT": 1990 },
        "selection": { "fields": [{ "name": "count" }] }
    }));

    assert_contains(&program.cypher, "MATCH (this:Movie)");
    assert_contains(&program.cypher, "WHERE this.releaseYear > $this_released");
    assert_contains(&program.cypher, "RETURN count(this) AS this_count");
    assert_contains(&program.cypher, "RETURN { count: this_count } AS this");
    assert_eq!(vec!["this".to_owned()], program.columns);
}

#[test]
fn unknown_aggregated_fields_are_rejected() {
    assert!(matches!(
        compile_err(json!({
            "operation": "aggregate",
            "target": "Movie",
            "selection": { "fields": [{ "name": "budget" }] }
        })),
        CompileError::Input(InputValidationError::UnknownField { .. })
    ));
}

#[test]
fn connections_collect_edges_and_count_them() {
    let program = compile(json!({
        "operation": "read",
        "target": "Movie",
        "selection": {
            "fields": [{
                "name": "actorsConnection",
                "selection": {
                    "fields": [
                        { "name": "totalCount" },
                        {
                            "name": "edges",
                            "selection": {
                                "fields": [
                                    { "name": "properties", "selection": { "fields": [{ "name": "role" }] } },
                                    { "name": "node", "selection": { "fields": [{ "name": "name" }] } }
                                ]
                            }
                        }
                    ]
                }
            }]
        }
    }));

    assert_contains(
        &program.cypher,
        "MATCH (this)<-[this_actorsConnection_rel:ACTED_IN]-(this_actorsConnection_node:Actor)",
    );
    assert_contains(&program.cypher, "AS this_actorsConnection_totalCount");
    assert_contains(&program.cypher, "totalCount: this_actorsConnection_totalCount");
}
