use super::{
    Precomputed, aggregations::nested_aggregate, computed::computed_subquery, connection::connection_subquery,
    related::related_subquery,
};
use crate::{CompileResult, InputValidationError, context::Session, operation::SelectedField};
use cypher_builder::ast::*;
use indexmap::IndexSet;
use query_structure::{Entity, Field, FieldContainer, RelationField, ScalarField};

pub(crate) const TYPENAME: &str = "__typename";

/// The map a node is returned as, and the subqueries its entries read from.
#[derive(Debug, Default)]
pub(crate) struct Projection {
    pub(crate) subqueries: Vec<Call>,
    pub(crate) items: Vec<MapProjectionItem>,
}

impl Projection {
    /// Pushes the subqueries into `statement` and returns `node { .. }`.
    pub(crate) fn push_into(self, statement: &mut Statement, node: &Variable) -> Expression {
        for subquery in self.subqueries {
            statement.push(subquery);
        }

        Expression::map_projection(node, self.items)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ProjectionOptions<'a> {
    /// Adds `__typename` even when it is not selected, for results mixing node types.
    pub(crate) typename: bool,
    /// Computed fields already evaluated for sorting.
    pub(crate) precomputed: Option<&'a Precomputed>,
    /// Fields the caller sorts the maps by, included under their own name.
    pub(crate) sort_fields: &'a [&'a str],
}

/// Projects the `fields` selected on `node`, a node of type `entity`.
///
/// Stored fields become map entries, relationship, connection, aggregate and computed fields
/// become subqueries bound to `{node}_{key}`. The first field to claim a key wins.
pub(crate) fn project(
    session: &mut Session<'_>,
    node: &Variable,
    entity: &Entity,
    fields: &[&SelectedField],
    options: &ProjectionOptions<'_>,
) -> CompileResult<Projection> {
    let mut projector = Projector {
        session,
        node,
        entity,
        options,
        keys: IndexSet::new(),
        projection: Projection::default(),
    };

    for selected in fields {
        projector.field(selected)?;
    }

    for name in options.sort_fields {
        projector.sort_field(name)?;
    }

    if options.typename {
        projector.entry(TYPENAME, Expression::string(entity.name()));
    }

    Ok(projector.projection)
}

struct Projector<'s, 'a, 'o> {
    session: &'s mut Session<'a>,
    node: &'o Variable,
    entity: &'o Entity,
    options: &'o ProjectionOptions<'o>,
    keys: IndexSet<String>,
    projection: Projection,
}

impl Projector<'_, '_, '_> {
    fn field(&mut self, selected: &SelectedField) -> CompileResult<()> {
        let key = selected.response_key();

        if self.keys.contains(key) {
            return Ok(());
        }

        if selected.name == TYPENAME {
            self.entry(key, Expression::string(self.entity.name()));
            return Ok(());
        }

        match self.entity.find_field(&selected.name) {
            Some(Field::Scalar(sf)) if sf.is_stored() => self.scalar(key, &sf),
            Some(Field::Scalar(sf)) => self.custom_resolver(&sf)?,
            Some(Field::Computed(cf)) => {
                let value = match self.precomputed(cf.name()) {
                    Some(value) => value,
                    None => {
                        let result = self.node.child(key);
                        let call = computed_subquery(self.session, self.node, &cf, Some(selected), &result)?;
                        self.projection.subqueries.push(call);
                        result
                    }
                };

                self.entry(key, Expression::from(value));
            }
            Some(Field::Relation(rf)) => {
                let result = self.node.child(key);
                let call = related_subquery(self.session, self.node, &rf, selected, &result)?;
                self.projection.subqueries.push(call);
                self.entry(key, Expression::from(result));
            }
            None => {
                if let Some(rf) = self.relation_field(&selected.name, "Connection") {
                    let result = self.node.child(key);
                    let call = connection_subquery(self.session, self.node, &rf, selected, &result)?;
                    self.projection.subqueries.push(call);
                    self.entry(key, Expression::from(result));
                } else if let Some(rf) = self.relation_field(&selected.name, "Aggregate") {
                    let result = self.node.child(key);
                    let (calls, value) = nested_aggregate(self.session, self.node, &rf, selected, &result)?;
                    self.projection.subqueries.extend(calls);
                    self.entry(key, value);
                } else {
                    return Err(InputValidationError::unknown_field(self.entity.name(), &selected.name).into());
                }
            }
        }

        Ok(())
    }

    /// `actorsConnection` and `actorsAggregate` refer to the `actors` relationship.
    fn relation_field(&self, name: &str, suffix: &str) -> Option<RelationField> {
        name.strip_suffix(suffix)
            .and_then(|base| self.entity.find_relation_field(base))
    }

    fn scalar(&mut self, key: &str, field: &ScalarField) {
        let plain = key == field.name() && field.db_name() == field.name() && field.coalesce_value().is_none();

        if plain {
            self.keys.insert(key.to_owned());
            self.projection.items.push(MapProjectionItem::Property(key.to_owned()));
            return;
        }

        let mut value = self.node.property(field.db_name());

        if let Some(default) = field.coalesce_value() {
            let default = Expression::param(format!("{}_{}_default", self.node, field.name()), default.clone());
            value = Expression::function("coalesce", vec![value, default]);
        }

        self.entry(key, value);
    }

    /// Custom resolved fields are computed by the caller from the fields they require.
    fn custom_resolver(&mut self, field: &ScalarField) -> CompileResult<()> {
        for required in field.custom_resolver_requires().unwrap_or_default() {
            match self.entity.find_scalar_field(required) {
                Some(sf) if sf.is_stored() => {
                    if !self.keys.contains(sf.name()) {
                        self.scalar(sf.name(), &sf);
                    }
                }
                _ => {
                    return Err(InputValidationError::unsupported(
                        "read",
                        &field.to_string(),
                        format!("required field `{required}` is not a stored field"),
                    )
                    .into());
                }
            }
        }

        Ok(())
    }

    fn sort_field(&mut self, name: &str) -> CompileResult<()> {
        if self.keys.contains(name) {
            return Ok(());
        }

        if let Some(value) = self.precomputed(name) {
            self.entry(name, Expression::from(value));
            return Ok(());
        }

        match self.entity.find_scalar_field(name) {
            Some(sf) => {
                self.scalar(name, &sf);
                Ok(())
            }
            None => Err(InputValidationError::InvalidSortField {
                field: format!("{}.{name}", self.entity.name()),
            }
            .into()),
        }
    }

    fn precomputed(&self, name: &str) -> Option<Variable> {
        self.options.precomputed.and_then(|p| p.get(name)).cloned()
    }

    fn entry(&mut self, key: &str, value: Expression) {
        if self.keys.insert(key.to_owned()) {
            self.projection.items.push(MapProjectionItem::Entry(key.to_owned(), value));
        }
    }
}
