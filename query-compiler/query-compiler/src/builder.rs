use crate::{CompileResult, InputValidationError, Operation, context::Session, read, write};
use cypher_builder::ast::Statement;
use query_structure::{CompositeType, Entity, Schema};

/// A statement and the columns of its result rows.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) statement: Statement,
    pub(crate) columns: Vec<String>,
}

impl Compiled {
    pub(crate) fn new<I, S>(statement: Statement, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Compiled {
            statement,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

pub(crate) fn build(session: &mut Session<'_>, operation: &Operation) -> CompileResult<Compiled> {
    tracing::trace!(target_type = operation.target(), "building statement");

    match operation {
        Operation::Read(op) => read::read(session, op),
        Operation::Aggregate(op) => read::aggregate(session, op),
        Operation::Create(op) => write::create(session, op),
        Operation::Update(op) => write::update(session, op),
        Operation::Delete(op) => write::delete(session, op),
    }
}

/// The node type, interface or union an operation names.
pub(crate) fn resolve_target(schema: &Schema, name: &str) -> CompileResult<CompositeType> {
    schema
        .composite_by_name(name)
        .ok_or_else(|| InputValidationError::UnknownType { name: name.to_owned() }.into())
}

/// Writes start from a concrete node type.
pub(crate) fn resolve_entity(schema: &Schema, name: &str, operation: &str) -> CompileResult<Entity> {
    match resolve_target(schema, name)? {
        CompositeType::Entity(entity) => Ok(entity),
        other => Err(InputValidationError::unsupported(
            operation,
            other.name(),
            "top-level writes need a concrete node type",
        )
        .into()),
    }
}
