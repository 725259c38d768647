//! Computed fields: user statements run once per node in a subquery.
//!
//! ```text
//! CALL {
//!     WITH node
//!     CALL {
//!         WITH node
//!         WITH node AS this
//!         <statement>
//!     }
//!     RETURN head(collect(<column>)) AS result
//! }
//! ```
//!
//! The statement sees the node as `this` and hands back its value in its column.

use super::{Precomputed, ProjectionOptions, project};
use crate::{CompileResult, InputValidationError, context::Session, operation::SelectedField};
use cypher_builder::ast::*;
use query_structure::{ComputedField, ComputedReturn, Entity, FieldContainer, OrderBy};

const STATEMENT_NODE: &str = "this";

/// Evaluates `field` for `node` into `result`. Node typed fields project `selected` on the
/// returned nodes.
pub(crate) fn computed_subquery(
    session: &mut Session<'_>,
    node: &Variable,
    field: &ComputedField,
    selected: Option<&SelectedField>,
    result: &Variable,
) -> CompileResult<Call> {
    let column = Variable::new(field.column_name());

    if column == *node {
        return Err(InputValidationError::unsupported(
            "read",
            &format!("{}.{}", field.container_name(), field.name()),
            format!("the statement column `{column}` hides the node"),
        )
        .into());
    }

    let mut statement = Statement::new();

    if node.name() != STATEMENT_NODE {
        statement.push(With::new().item((node.clone(), Variable::new(STATEMENT_NODE))));
    }

    statement.push(Raw::new(field.statement(), vec![column.clone()]));

    let mut body = Statement::new().with(Call::new(statement).import(node));

    match field.returns() {
        ComputedReturn::Scalar(_) => {
            let value = Expression::from(&column);
            let value = if field.is_list() { value.collect() } else { value.head_of_collect() };

            body.push(Return::new().item((value, result.clone())));
        }
        ComputedReturn::Entity(entity) => {
            body.push(With::new().item((column, result.clone())));

            let fields = selected.map(|s| s.selection.fields_for(entity.name())).unwrap_or_default();
            let projection = project(session, result, &entity, &fields, &ProjectionOptions::default())?;
            let value = projection.push_into(&mut body, result);
            let value = if field.is_list() { value.collect() } else { value.head_of_collect() };

            body.push(Return::new().item((value, result.clone())));
        }
    }

    Ok(Call::new(body).import(node))
}

/// Evaluates the computed fields `args` sorts on, so that sorting sees them. Each one is bound
/// to `{node}_{field}`.
pub(crate) fn sort_subqueries<'a>(
    session: &mut Session<'_>,
    statement: &mut Statement,
    node: &Variable,
    entity: &Entity,
    order_by: impl IntoIterator<Item = &'a OrderBy>,
) -> CompileResult<Precomputed> {
    let mut precomputed = Precomputed::new();

    for order_by in order_by {
        let OrderBy::Computed(order) = order_by else {
            continue;
        };

        // Interface sorts name the interface field, the implementation holds the statement.
        let Some(field) = entity.find_computed_field(order.field.name()) else {
            continue;
        };

        if precomputed.contains_key(field.name()) {
            continue;
        }

        let result = node.child(field.name());
        statement.push(computed_subquery(session, node, &field, None, &result)?);
        precomputed.insert(field.name().to_owned(), result);
    }

    Ok(precomputed)
}
