//! Reads: a top-level match of the target type, then one map projection per node.
//!
//! ```text
//! MATCH (this:Movie)
//! WHERE <filter> AND <authorization>
//! CALL { <computed fields sorted on> }
//! WITH * ORDER BY .. SKIP .. LIMIT ..
//! CALL { <relationships, connections, aggregations, other computed fields> }
//! RETURN this { .. } AS this
//! ```
//!
//! Computed fields only run before the pagination when the read sorts on them. Interface and
//! union reads are built in `polymorphic`.

mod aggregations;
mod computed;
mod connection;
mod polymorphic;
mod projection;
mod related;
mod utils;

pub(crate) use aggregations::aggregate;
pub(crate) use projection::{ProjectionOptions, TYPENAME, project};
pub(crate) use utils::Precomputed;

use crate::{
    CompileResult,
    authorization::authorization_predicates,
    builder::{Compiled, resolve_target},
    context::Session,
    extractors::{FilterTarget, QueryArguments, extract_filter},
    operation::ReadOperation,
    translate::{filter_predicate, node_pattern},
};
use computed::sort_subqueries;
use polymorphic::{AbstractRead, TypeBranch};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, CompositeType, Entity, Filter, Narrowed};
use utils::{node_sort_key, paginate, query_args};

/// Name of the node variable and of the result column of reads.
pub(crate) const ROOT: &str = "this";

#[tracing::instrument(skip_all, fields(target = %op.target))]
pub(crate) fn read(session: &mut Session<'_>, op: &ReadOperation) -> CompileResult<Compiled> {
    let target = resolve_target(session.schema, &op.target)?;
    let filter = match &op.filter {
        Some(map) => extract_filter(session, map.clone(), &FilterTarget::from(target.clone()))?,
        None => Filter::empty(),
    };
    let args = query_args(&target, op.options.clone())?;

    let reader = TopLevelRead {
        op,
        filter: &filter,
        args: &args,
    };

    let statement = match target {
        CompositeType::Entity(entity) => reader.entity(session, &entity)?,
        target => reader.abstract_target(session, target.concrete_entities())?,
    };

    Ok(Compiled::new(statement, [ROOT]))
}

struct TopLevelRead<'r> {
    op: &'r ReadOperation,
    filter: &'r Filter,
    args: &'r QueryArguments,
}

impl TopLevelRead<'_> {
    /// `MATCH (this:Type) WHERE ..`, `None` when the filter rules the type out.
    fn matching(&self, session: &mut Session<'_>, node: &Variable, entity: &Entity) -> CompileResult<Option<Statement>> {
        let Narrowed::Applies(filter) = self.filter.clone().narrow_to(entity) else {
            tracing::trace!(entity = %entity, "filter excludes node type");
            return Ok(None);
        };

        let auth = authorization_predicates(session, entity, AuthorizationOperation::Read, node)?;

        let read = Match::new(node_pattern(node, entity))
            .so_that(filter_predicate(&filter, node, Some(entity)))
            .so_that(auth.where_predicate());

        Ok(Some(Statement::new().with(read)))
    }

    fn entity(&self, session: &mut Session<'_>, entity: &Entity) -> CompileResult<Statement> {
        let node = Variable::new(ROOT);

        let Some(mut statement) = self.matching(session, &node, entity)? else {
            return Ok(nothing(&node));
        };

        let precomputed = sort_subqueries(session, &mut statement, &node, entity, &self.args.order_by)?;

        if let Some(with) = paginate(With::star(), self.args, &node, |o| node_sort_key(&node, o, &precomputed)) {
            statement.push(with);
        }

        let fields = self.op.selection.fields_for(entity.name());
        let options = ProjectionOptions {
            precomputed: Some(&precomputed),
            ..Default::default()
        };

        let projection = project(session, &node, entity, &fields, &options)?;
        let value = projection.push_into(&mut statement, &node);

        statement.push(Return::new().item((value, node)));

        Ok(statement)
    }

    /// One `UNION` branch per concrete type, the maps tagged with `__typename`.
    fn abstract_target(&self, session: &mut Session<'_>, entities: Vec<Entity>) -> CompileResult<Statement> {
        let node = Variable::new(ROOT);
        let mut branches = Vec::with_capacity(entities.len());

        for entity in entities {
            let Some(mut statement) = self.matching(session, &node, &entity)? else {
                continue;
            };

            let precomputed = sort_subqueries(session, &mut statement, &node, &entity, &self.args.order_by)?;

            branches.push(TypeBranch {
                entity,
                statement,
                precomputed,
            });
        }

        if branches.is_empty() {
            return Ok(nothing(&node));
        }

        let read = AbstractRead {
            node: &node,
            item: &node,
            args: self.args,
            selection: &self.op.selection,
            imports: &[],
        };

        let (mut statement, maps) = read.build(session, branches)?;

        if maps == node {
            statement.push(Return::new().item(&node));
        } else {
            statement.push(Return::new().item((maps, node)));
        }

        Ok(statement)
    }
}

/// A read returning no rows.
fn nothing(node: &Variable) -> Statement {
    Statement::new()
        .with(Unwind::new(Expression::list(Vec::new()), node))
        .with(Return::new().item(node))
}
