//! Reads of relationship fields.
//!
//! A concrete target is read in one subquery:
//!
//! ```text
//! CALL {
//!     WITH this
//!     MATCH (this)<-[:ACTED_IN]-(this_actors:Actor)
//!     WHERE <filter> AND <authorization>
//!     WITH * ORDER BY .. SKIP .. LIMIT ..
//!     RETURN collect(this_actors { .. }) AS this_actors
//! }
//! ```
//!
//! Interface and union targets read every node type in a `UNION`, see `polymorphic`.

use super::{
    ProjectionOptions,
    computed::sort_subqueries,
    polymorphic::{AbstractRead, TypeBranch},
    project,
    utils::{node_sort_key, paginate, query_args},
};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    context::Session,
    extractors::{FilterTarget, QueryArguments, extract_filter},
    input::InputMap,
    operation::SelectedField,
    translate::{directed_read, filter_predicate, node_pattern, related_in_direction},
};
use cypher_builder::ast::*;
use query_structure::{AuthorizationOperation, CompositeType, Entity, Filter, Narrowed, RelationField};

const ARGUMENTS: [&str; 3] = ["where", "options", "directed"];

/// Reads the nodes related through `field` into `result`: a list of maps, or a single map
/// (or null) for singular relationships.
pub(crate) fn related_subquery(
    session: &mut Session<'_>,
    parent: &Variable,
    field: &RelationField,
    selected: &SelectedField,
    result: &Variable,
) -> CompileResult<Call> {
    let arguments = &selected.arguments;

    if let Some(key) = arguments.keys().find(|key| !ARGUMENTS.contains(&key.as_str())) {
        return Err(InputValidationError::unknown_field(&field.to_string(), key).into());
    }

    let target = field.target();
    let filter = extract_where(session, arguments, FilterTarget::from(target.clone()))?;
    let options = option_map(arguments)?;
    let args = query_args(&target, options)?;

    let read = RelatedRead {
        parent,
        field,
        selected,
        result,
        filter: &filter,
        args: &args,
        directed: directed_read(field, arguments),
    };

    let body = match target {
        CompositeType::Entity(entity) => read.entity(session, &entity)?,
        target => read.abstract_target(session, target.concrete_entities())?,
    };

    Ok(Call::new(body).import(parent))
}

pub(super) fn extract_where(session: &mut Session<'_>, arguments: &InputMap, target: FilterTarget) -> CompileResult<Filter> {
    match arguments.get("where") {
        Some(value) if !value.is_null() => extract_filter(session, value.clone().into_map("where")?, &target),
        _ => Ok(Filter::empty()),
    }
}

fn option_map(arguments: &InputMap) -> CompileResult<Option<InputMap>> {
    match arguments.get("options") {
        Some(value) if !value.is_null() => Ok(Some(value.clone().into_map("options")?)),
        _ => Ok(None),
    }
}

struct RelatedRead<'r> {
    parent: &'r Variable,
    field: &'r RelationField,
    selected: &'r SelectedField,
    result: &'r Variable,
    filter: &'r Filter,
    args: &'r QueryArguments,
    directed: bool,
}

impl RelatedRead<'_> {
    /// `MATCH` of the related nodes of one type with filter and authorization. `None` when the
    /// filter excludes the type.
    fn matching(
        &self,
        session: &mut Session<'_>,
        node: &Variable,
        entity: &Entity,
    ) -> CompileResult<Option<Statement>> {
        let Narrowed::Applies(filter) = self.filter.clone().narrow_to(entity) else {
            return Ok(None);
        };

        let auth = authorization_predicates(session, entity, AuthorizationOperation::Read, node)?;
        let pattern = related_in_direction(self.parent, self.field, None, node_pattern(node, entity), self.directed);

        let read = Match::new(pattern)
            .so_that(filter_predicate(&filter, node, Some(entity)))
            .so_that(auth.where_predicate());

        Ok(Some(Statement::new().with(read)))
    }

    fn entity(&self, session: &mut Session<'_>, entity: &Entity) -> CompileResult<Statement> {
        let node = self.result;

        let Some(mut body) = self.matching(session, node, entity)? else {
            return Ok(self.empty_result());
        };

        let precomputed = sort_subqueries(session, &mut body, node, entity, &self.args.order_by)?;

        if let Some(with) = paginate(With::star(), self.args, node, |o| node_sort_key(node, o, &precomputed)) {
            body.push(with);
        }

        let fields = self.selected.selection.fields_for(entity.name());
        let options = ProjectionOptions {
            precomputed: Some(&precomputed),
            ..Default::default()
        };

        let projection = project(session, node, entity, &fields, &options)?;
        let value = projection.push_into(&mut body, node);

        body.push(Return::new().item((self.aggregate(value), self.result.clone())));

        Ok(body)
    }

    fn abstract_target(&self, session: &mut Session<'_>, entities: Vec<Entity>) -> CompileResult<Statement> {
        let node = self.result;
        let mut branches = Vec::with_capacity(entities.len());

        for entity in entities {
            let Some(mut statement) = self.matching(session, node, &entity)? else {
                continue;
            };

            let precomputed = sort_subqueries(session, &mut statement, node, &entity, &self.args.order_by)?;

            branches.push(TypeBranch {
                entity,
                statement,
                precomputed,
            });
        }

        if branches.is_empty() {
            return Ok(self.empty_result());
        }

        let read = AbstractRead {
            node,
            item: &node.child("item"),
            args: self.args,
            selection: &self.selected.selection,
            imports: &[self.parent],
        };

        let (mut body, item) = read.build(session, branches)?;

        body.push(Return::new().item((self.aggregate(Expression::from(&item)), self.result.clone())));

        Ok(body)
    }

    /// `collect(value)`, or `head(collect(value))` for singular relationships.
    fn aggregate(&self, value: Expression) -> Expression {
        if self.field.is_list() {
            value.collect()
        } else {
            value.head_of_collect()
        }
    }

    /// `RETURN [] AS result`, when the filter rules out every node type.
    fn empty_result(&self) -> Statement {
        let empty = if self.field.is_list() {
            Expression::list(Vec::new())
        } else {
            Expression::null()
        };

        Statement::new().with(Return::new().item((empty, self.result.clone())))
    }
}
