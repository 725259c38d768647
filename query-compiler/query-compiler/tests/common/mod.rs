pub(crate) use graph_value::GraphValue;
pub(crate) use serde_json::json;

use query_compiler::{CompileError, CompilerConfig, Operation, Program, QueryCompiler, RequestContext};
use query_structure::{Schema, definition::SchemaDefinition};

pub(crate) fn schema() -> Schema {
    let definition = SchemaDefinition::from_json(include_str!("../fixtures/movies.json")).unwrap();
    Schema::build(definition).unwrap()
}

pub(crate) fn compiler() -> QueryCompiler {
    QueryCompiler::new(schema())
}

pub(crate) fn compiler_with(config: CompilerConfig) -> QueryCompiler {
    compiler().with_config(config)
}

pub(crate) fn operation(value: serde_json::Value) -> Operation {
    serde_json::from_value(value).unwrap()
}

/// A request carrying the given claims.
pub(crate) fn user(claims: serde_json::Value) -> RequestContext {
    match claims {
        serde_json::Value::Object(claims) => RequestContext::authenticated(claims),
        other => panic!("claims must be an object, got {other}"),
    }
}

#[track_caller]
pub(crate) fn compile(value: serde_json::Value) -> Program {
    compile_with(&compiler(), value, &RequestContext::anonymous())
}

#[track_caller]
pub(crate) fn compile_with(compiler: &QueryCompiler, value: serde_json::Value, request: &RequestContext) -> Program {
    match compiler.compile(&operation(value), request) {
        Ok(program) => program,
        Err(err) => panic!("compilation failed: {err}"),
    }
}

#[track_caller]
pub(crate) fn compile_err(value: serde_json::Value) -> CompileError {
    match compiler().compile(&operation(value), &RequestContext::anonymous()) {
        Ok(program) => panic!("expected an error, compiled:\n{}", program.cypher),
        Err(err) => err,
    }
}

/// Asserts `fragment` occurs in the compiled text, printing the text otherwise.
#[track_caller]
pub(crate) fn assert_contains(cypher: &str, fragment: &str) {
    assert!(cypher.contains(fragment), "`{fragment}` not found in:\n{cypher}");
}

#[track_caller]
pub(crate) fn assert_not_contains(cypher: &str, fragment: &str) {
    assert!(!cypher.contains(fragment), "`{fragment}` unexpectedly found in:\n{cypher}");
}

/// Asserts `first` occurs, and before `second`.
#[track_caller]
pub(crate) fn assert_before(cypher: &str, first: &str, second: &str) {
    let first_at = cypher.find(first);
    let second_at = cypher.find(second);

    match (first_at, second_at) {
        (Some(a), Some(b)) => assert!(a < b, "`{first}` comes after `{second}` in:\n{cypher}"),
        _ => panic!("`{first}` or `{second}` not found in:\n{cypher}"),
    }
}
