//! Aggregations: one subquery per aggregated value, merged into a map.
//!
//! ```text
//! CALL {
//!     MATCH (this:Movie)
//!     WHERE ..
//!     RETURN count(this) AS this_count
//! }
//! CALL {
//!     MATCH (this:Movie)
//!     WHERE ..
//!     WITH this ORDER BY size(this.title) DESC
//!     WITH collect(this.title) AS this_title_list
//!     RETURN { longest: head(this_title_list), shortest: last(this_title_list) } AS this_title
//! }
//! RETURN { count: this_count, title: this_title } AS this
//! ```
//!
//! Nested aggregations, `{field}Aggregate`, match the related nodes from the parent and also
//! aggregate `node` and `edge` fields.

use super::{ROOT, TYPENAME, related::extract_where};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    builder::{Compiled, resolve_target},
    context::Session,
    extractors::{FilterTarget, extract_filter},
    operation::{AggregateOperation, SelectedField, Selection},
    translate::{directed_read, filter_predicate, has_type, node_pattern, related_in_direction},
};
use cypher_builder::ast::*;
use query_structure::{
    AuthorizationOperation, CompositeType, FieldContainer, Filter, Narrowed, RelationField, ScalarField, ScalarType,
};

const COUNT: &str = "count";
const ARGUMENTS: [&str; 2] = ["where", "directed"];

#[tracing::instrument(skip_all, fields(target = %op.target))]
pub(crate) fn aggregate(session: &mut Session<'_>, op: &AggregateOperation) -> CompileResult<Compiled> {
    let target = resolve_target(session.schema, &op.target)?;
    let node = Variable::new(ROOT);

    let filter = match &op.filter {
        Some(map) => extract_filter(session, map.clone(), &FilterTarget::from(target.clone()))?,
        None => Filter::empty(),
    };

    let pattern = match &target {
        CompositeType::Entity(entity) => Pattern::from(node_pattern(&node, entity)),
        _ => Pattern::from(NodePattern::new(&node)),
    };

    let source = matching(session, pattern, &node, &target, &filter)?;

    let container: Option<&dyn FieldContainer> = match &target {
        CompositeType::Entity(entity) => Some(entity),
        CompositeType::Interface(interface) => Some(interface),
        CompositeType::Union(_) => None,
    };

    let aggregator = Aggregator { source, parent: None };
    let mut calls = Vec::new();
    let mut entries = Vec::new();

    for selected in op.selection.fields.iter() {
        let key = selected.response_key();

        match selected.name.as_str() {
            COUNT => {
                let result = node.child(key);
                calls.push(aggregator.count(&node, &result));
                entries.push((key.to_owned(), Expression::from(result)));
            }
            TYPENAME => entries.push((key.to_owned(), Expression::string(format!("{}AggregateSelection", target.name())))),
            name => {
                let field = container
                    .and_then(|c| c.find_scalar_field(name))
                    .ok_or_else(|| InputValidationError::unknown_field(&format!("{}Aggregate", target.name()), name))?;

                let result = node.child(key);
                calls.push(aggregator.field(&node, &field, selected, &result)?);
                entries.push((key.to_owned(), Expression::from(result)));
            }
        }
    }

    let mut statement: Statement = calls.into_iter().collect();
    statement.push(Return::new().item((Expression::map(entries), node)));

    Ok(Compiled::new(statement, [ROOT]))
}

/// `{field}Aggregate { count node { .. } edge { .. } }` of `parent`. Returns the subqueries and
/// the map they are merged into.
pub(crate) fn nested_aggregate(
    session: &mut Session<'_>,
    parent: &Variable,
    field: &RelationField,
    selected: &SelectedField,
    result: &Variable,
) -> CompileResult<(Vec<Call>, Expression)> {
    let container_name = format!("{}Aggregate", field);
    let arguments = &selected.arguments;

    if let Some(key) = arguments.keys().find(|key| !ARGUMENTS.contains(&key.as_str())) {
        return Err(InputValidationError::unknown_field(&container_name, key).into());
    }

    let target = field.target();
    let filter = extract_where(session, arguments, FilterTarget::from(target.clone()))?;

    let node = result.child("node");
    let rel = result.child("rel");

    let to = match &target {
        CompositeType::Entity(entity) => node_pattern(&node, entity),
        _ => NodePattern::new(&node),
    };

    let pattern = related_in_direction(parent, field, Some(&rel), to, directed_read(field, arguments));
    let source = matching(session, pattern, &node, &target, &filter)?;

    let aggregator = Aggregator {
        source,
        parent: Some(parent),
    };

    let mut calls = Vec::new();
    let mut entries = Vec::new();

    for aggregated in selected.selection.fields.iter() {
        let key = aggregated.response_key();

        match aggregated.name.as_str() {
            COUNT => {
                let count = result.child(key);
                calls.push(aggregator.count(&node, &count));
                entries.push((key.to_owned(), Expression::from(count)));
            }
            "node" => {
                let container: &dyn FieldContainer = match &target {
                    CompositeType::Entity(entity) => entity,
                    CompositeType::Interface(interface) => interface,
                    CompositeType::Union(_) => {
                        return Err(InputValidationError::unsupported(
                            "aggregate",
                            &field.to_string(),
                            "union members share no fields",
                        )
                        .into());
                    }
                };

                let base = result.child(key);
                let value = aggregator.fields(&node, container, &aggregated.selection, &base, &mut calls)?;
                entries.push((key.to_owned(), value));
            }
            "edge" => {
                let properties = field
                    .properties()
                    .ok_or_else(|| InputValidationError::unknown_field(&container_name, "edge"))?;

                let base = result.child(key);
                let value = aggregator.fields(&rel, &properties, &aggregated.selection, &base, &mut calls)?;
                entries.push((key.to_owned(), value));
            }
            TYPENAME => entries.push((key.to_owned(), Expression::string(container_name.clone()))),
            name => return Err(InputValidationError::unknown_field(&container_name, name).into()),
        }
    }

    Ok((calls, Expression::map(entries)))
}

/// `MATCH pattern WHERE <types> AND <filter> AND <authorization>` over the nodes of `target`
/// bound to `node`. Interfaces and unions match an unlabeled node guarded by the labels of their
/// types.
fn matching(
    session: &mut Session<'_>,
    pattern: Pattern,
    node: &Variable,
    target: &CompositeType,
    filter: &Filter,
) -> CompileResult<Statement> {
    let predicate = match target {
        CompositeType::Entity(entity) => {
            let filter = match filter.clone().narrow_to(entity) {
                Narrowed::Applies(filter) => filter_predicate(&filter, node, Some(entity)),
                Narrowed::Excluded => Predicate::Literal(false),
            };

            let auth = authorization_predicates(session, entity, AuthorizationOperation::Aggregate, node)?;

            Predicate::and([filter, auth.where_predicate()])
        }
        target => {
            let entities = target.concrete_entities();
            let mut alternatives = Vec::with_capacity(entities.len());

            for entity in entities.iter() {
                let auth = authorization_predicates(session, entity, AuthorizationOperation::Aggregate, node)?;
                alternatives.push(Predicate::and([has_type(node, entity), auth.where_predicate()]));
            }

            Predicate::and([Predicate::or(alternatives), filter_predicate(filter, node, None)])
        }
    };

    Ok(Statement::new().with(Match::new(pattern).so_that(predicate)))
}

/// Builds the subqueries of an aggregation selection over one source match.
struct Aggregator<'a> {
    source: Statement,
    parent: Option<&'a Variable>,
}

impl Aggregator<'_> {
    fn call(&self, tail: Statement) -> Call {
        let mut body = self.source.clone();
        body.append(tail);

        match self.parent {
            Some(parent) => Call::new(body).import(parent),
            None => Call::new(body),
        }
    }

    fn count(&self, subject: &Variable, result: &Variable) -> Call {
        let count = Expression::function("count", vec![Expression::from(subject)]);
        self.call(Statement::new().with(Return::new().item((count, result.clone()))))
    }

    /// One subquery per selected field of `container`, merged into `{ field: { min, .. } }`.
    fn fields(
        &self,
        subject: &Variable,
        container: &dyn FieldContainer,
        selection: &Selection,
        base: &Variable,
        calls: &mut Vec<Call>,
    ) -> CompileResult<Expression> {
        let mut entries = Vec::with_capacity(selection.fields.len());

        for selected in selection.fields.iter() {
            let key = selected.response_key();

            let field = container
                .find_scalar_field(&selected.name)
                .ok_or_else(|| InputValidationError::unknown_field(container.container_name(), &selected.name))?;

            let result = base.child(key);
            calls.push(self.field(subject, &field, selected, &result)?);
            entries.push((key.to_owned(), Expression::from(result)));
        }

        Ok(Expression::map(entries))
    }

    fn field(&self, subject: &Variable, field: &ScalarField, selected: &SelectedField, result: &Variable) -> CompileResult<Call> {
        if field.is_list() || !field.is_stored() {
            return Err(InputValidationError::InvalidOperator {
                field: field.to_string(),
                operator: String::from("aggregate"),
            }
            .into());
        }

        let tpe = field.type_identifier();
        let property = subject.property(field.db_name());
        let list = result.child("list");
        let mut entries = Vec::with_capacity(selected.selection.fields.len());

        for aggregated in selected.selection.fields.iter() {
            let function = aggregate_function(tpe, &aggregated.name).ok_or_else(|| InputValidationError::InvalidOperator {
                field: field.to_string(),
                operator: aggregated.name.clone(),
            })?;

            let value = match function {
                "head" | "last" => Expression::function(function, vec![Expression::from(&list)]),
                function => Expression::function(function, vec![property.clone()]),
            };

            entries.push((aggregated.response_key().to_owned(), value));
        }

        let mut tail = Statement::new();

        // Strings are ranked by length: the longest first.
        if tpe.is_string_like() {
            tail.push(With::new().item(subject).order_by(
                Expression::function("size", vec![property.clone()]),
                SortDirection::Descending,
            ));
            tail.push(With::new().item((property.collect(), list)));
        }

        tail.push(Return::new().item((Expression::map(entries), result.clone())));

        Ok(self.call(tail))
    }
}

/// The function computing an aggregate of a field of type `tpe`.
fn aggregate_function(tpe: ScalarType, aggregate: &str) -> Option<&'static str> {
    match aggregate {
        "longest" if tpe.is_string_like() => Some("head"),
        "shortest" if tpe.is_string_like() => Some("last"),
        "min" if tpe.is_numeric() || tpe.is_temporal() => Some("min"),
        "max" if tpe.is_numeric() || tpe.is_temporal() => Some("max"),
        "average" if tpe.is_numeric() => Some("avg"),
        "sum" if tpe.is_numeric() => Some("sum"),
        _ => None,
    }
}
