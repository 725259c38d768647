use crate::common::*;
use pretty_assertions::assert_eq;
use query_compiler::{AuthorizationProvider, RequestContext, RuntimeError, RuntimeViolation};
use query_structure::{AuthorizationOperation, AuthorizationRule, Entity};

fn read_posts(request: &RequestContext) -> query_compiler::Program {
    compile_with(
        &compiler(),
        json!({
            "operation": "read",
            "target": "Post",
            "selection": { "fields": [{ "name": "content" }] }
        }),
        request,
    )
}

#[test]
fn filter_rules_restrict_reads() {
    let program = read_posts(&RequestContext::anonymous());

    assert_contains(
        &program.cypher,
        "EXISTS { MATCH (this)<-[:HAS_POST]-(this_creator_some:User) WHERE $jwt.sub IS NOT NULL AND this_creator_some.id = $jwt.sub }",
    );
    assert_contains(&program.cypher, " OR ");
    assert_contains(&program.cypher, "IN $jwt.roles");
    assert!(program.params.contains_key("jwt"));
}

#[test]
fn claims_are_passed_as_parameters() {
    let request = user(json!({ "sub": "user-1", "roles": ["editor"] }));
    let program = read_posts(&request);

    assert_eq!(
        Some(&GraphValue::try_from(json!({ "sub": "user-1", "roles": ["editor"] })).unwrap()),
        program.params.get("jwt")
    );
}

#[test]
fn related_reads_apply_the_rules_of_their_type() {
    let program = compile(json!({
        "operation": "read",
        "target": "User",
        "selection": {
            "fields": [{ "name": "posts", "selection": { "fields": [{ "name": "content" }] } }]
        }
    }));

    assert_contains(&program.cypher, "MATCH (this)-[:HAS_POST]->(this_posts:Post)");
    assert_contains(&program.cypher, "MATCH (this_posts)<-[:HAS_POST]-(this_posts_creator_some:User)");
}

#[test]
fn validate_rules_guard_writes() {
    let program = compile(json!({
        "operation": "update",
        "target": "Post",
        "where": { "id": "p1" },
        "update": { "content": "edited" },
        "selection": { "fields": [{ "name": "id" }] }
    }));

    // Before the write, inside the match.
    assert_before(
        &program.cypher,
        "apoc.util.validatePredicate(NOT EXISTS { MATCH (this)<-[:HAS_POST]-(this_creator_some:User)",
        "SET this.content = $this_content",
    );

    // After the write, aborting the transaction.
    assert_before(
        &program.cypher,
        "SET this.content = $this_content",
        "CALL apoc.util.validate(NOT EXISTS { MATCH (this)<-[:HAS_POST]-(this_creator_some:User)",
    );

    assert_contains(&program.cypher, "\"FORBIDDEN\", [0]");
}

#[test]
fn created_nodes_are_validated_after_the_write() {
    let program = compile(json!({
        "operation": "create",
        "target": "Post",
        "input": [{ "content": "hello", "creator": { "connect": { "where": { "node": { "id": "user-1" } } } } }],
        "selection": { "fields": [{ "name": "id" }] }
    }));

    assert_before(
        &program.cypher,
        "MERGE (this0)<-[this0_creator_connect0_rel:HAS_POST]-(this0_creator_connect0)",
        "CALL apoc.util.validate(NOT EXISTS { MATCH (this0)<-[:HAS_POST]-(this0_creator_some:User)",
    );
    assert_not_contains(&program.cypher, "apoc.util.validatePredicate");
}

struct Unrestricted;

impl AuthorizationProvider for Unrestricted {
    fn rules(&self, _: &Entity, _: AuthorizationOperation) -> Vec<AuthorizationRule> {
        Vec::new()
    }
}

#[test]
fn rules_come_from_the_provider() {
    let compiler = compiler().with_authorization(Unrestricted);
    let program = compile_with(
        &compiler,
        json!({
            "operation": "update",
            "target": "Post",
            "update": { "content": "edited" },
            "selection": { "fields": [{ "name": "content" }] }
        }),
        &RequestContext::anonymous(),
    );

    assert_not_contains(&program.cypher, "apoc.util");
    assert_not_contains(&program.cypher, "$jwt");
    assert!(!program.params.contains_key("jwt"));
}

#[test]
fn violations_are_recognized_in_database_errors() {
    let message = format!("Failed to invoke procedure `apoc.util.validate`: {}", RuntimeViolation::Forbidden.identifier());

    assert_eq!(Some(RuntimeError::AuthorizationForbidden), RuntimeError::from_database_message(&message));
}
