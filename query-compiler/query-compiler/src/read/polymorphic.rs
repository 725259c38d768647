//! Reads of interface and union targets: one `UNION` branch per node type.
//!
//! Without pagination, or when every selected field is stored, each branch projects its map
//! and the maps are sorted once combined. Otherwise the nodes are paginated first and projected
//! afterwards, so that subqueries only run for the nodes on the page:
//!
//! ```text
//! CALL {
//!     MATCH (this:Movie)
//!     RETURN this, this { .title } AS this_sort
//!     UNION
//!     MATCH (this:Series)
//!     RETURN this, this { .title } AS this_sort
//! }
//! WITH this, this_sort ORDER BY this_sort.title ASC LIMIT $this_limit
//! CALL {
//!     WITH this, this_sort
//!     WITH * WHERE this:Movie
//!     CALL { <computed fields, relationships> }
//!     RETURN this { .., __typename: "Movie" } AS this_item
//!     UNION
//!     ..
//! }
//! ```

use super::{
    Precomputed, ProjectionOptions, TYPENAME, project,
    utils::{map_sort_key, paginate},
};
use crate::{
    CompileResult,
    context::Session,
    extractors::QueryArguments,
    operation::{SelectedField, Selection},
    translate::has_type,
};
use cypher_builder::ast::*;
use query_structure::{Entity, Field, FieldContainer, OrderBy};

/// The match of one node type, with the computed fields it sorts on.
pub(super) struct TypeBranch {
    pub(super) entity: Entity,
    pub(super) statement: Statement,
    pub(super) precomputed: Precomputed,
}

pub(super) struct AbstractRead<'a> {
    /// The node of every branch.
    pub(super) node: &'a Variable,
    /// Column of the projected maps.
    pub(super) item: &'a Variable,
    pub(super) args: &'a QueryArguments,
    pub(super) selection: &'a Selection,
    /// Variables the branches read from the enclosing scope.
    pub(super) imports: &'a [&'a Variable],
}

impl AbstractRead<'_> {
    /// Builds the sorted and paginated maps. Returns the statement and the column holding them.
    pub(super) fn build(&self, session: &mut Session<'_>, branches: Vec<TypeBranch>) -> CompileResult<(Statement, Variable)> {
        let late = !self.args.is_empty()
            && branches.iter().any(|branch| {
                needs_subqueries(&branch.entity, &self.selection.fields_for(branch.entity.name()), &branch.precomputed)
            });

        if late {
            self.paginate_then_project(session, branches)
        } else {
            self.project_then_paginate(session, branches)
        }
    }

    fn project_then_paginate(
        &self,
        session: &mut Session<'_>,
        branches: Vec<TypeBranch>,
    ) -> CompileResult<(Statement, Variable)> {
        let sort_fields = self.sort_fields();
        let mut statements = Vec::with_capacity(branches.len());

        for TypeBranch {
            entity,
            mut statement,
            precomputed,
        } in branches
        {
            let fields = self.selection.fields_for(entity.name());
            let options = ProjectionOptions {
                typename: true,
                precomputed: Some(&precomputed),
                sort_fields: &sort_fields,
            };

            let projection = project(session, self.node, &entity, &fields, &options)?;
            let value = projection.push_into(&mut statement, self.node);

            statement.push(Return::new().item((value, self.item.clone())));
            statements.push(statement);
        }

        let mut statement = Statement::new().with(Call::union(statements).imports(self.imports.iter().copied()));

        if let Some(with) = paginate(With::variables([self.item]), self.args, self.node, |o| {
            map_sort_key(Expression::from(self.item), o)
        }) {
            statement.push(with);
        }

        Ok((statement, self.item.clone()))
    }

    fn paginate_then_project(
        &self,
        session: &mut Session<'_>,
        branches: Vec<TypeBranch>,
    ) -> CompileResult<(Statement, Variable)> {
        let node = self.node;
        let sort_fields = self.sort_fields();
        let sort = (!sort_fields.is_empty()).then(|| node.child("sort"));

        // The node keeps its name in the second step.
        let item = if self.item == node { node.child("item") } else { self.item.clone() };

        let mut matches = Vec::with_capacity(branches.len());
        let mut projections = Vec::with_capacity(branches.len());

        for TypeBranch {
            entity,
            mut statement,
            precomputed,
        } in branches
        {
            let mut returned = Return::new().item(node);

            if let Some(sort) = &sort {
                let options = ProjectionOptions {
                    precomputed: Some(&precomputed),
                    sort_fields: &sort_fields,
                    ..Default::default()
                };

                let keys = project(session, node, &entity, &[], &options)?.push_into(&mut statement, node);
                returned = returned.item((keys, sort.clone()));
            }

            statement.push(returned);
            matches.push(statement);

            let mut projection = Statement::new().with(With::star().so_that(has_type(node, &entity)));

            if let Some(sort) = &sort {
                for (name, variable) in precomputed.iter() {
                    projection.push(With::star().item((Expression::from(sort).property(name.as_str()), variable.clone())));
                }
            }

            let fields = self.selection.fields_for(entity.name());
            let options = ProjectionOptions {
                typename: true,
                precomputed: Some(&precomputed),
                ..Default::default()
            };

            let value = project(session, node, &entity, &fields, &options)?.push_into(&mut projection, node);

            projection.push(Return::new().item((value, item.clone())));
            projections.push(projection);
        }

        let mut statement = Statement::new().with(Call::union(matches).imports(self.imports.iter().copied()));
        let carried: Vec<&Variable> = std::iter::once(node).chain(sort.as_ref()).collect();

        let sort_key = |o: &OrderBy| match &sort {
            Some(sort) => map_sort_key(Expression::from(sort), o),
            None => Expression::from(node),
        };

        if let Some(with) = paginate(With::variables(carried.iter().copied()), self.args, node, sort_key) {
            statement.push(with);
        }

        statement.push(Call::union(projections).imports(carried.iter().copied()));

        Ok((statement, item))
    }

    fn sort_fields(&self) -> Vec<&str> {
        self.args.order_by.iter().map(|o| o.field_name()).collect()
    }
}

/// Whether projecting `fields` runs subqueries, beyond the computed fields already evaluated.
fn needs_subqueries(entity: &Entity, fields: &[&SelectedField], precomputed: &Precomputed) -> bool {
    fields.iter().any(|selected| {
        if selected.name == TYPENAME {
            return false;
        }

        match entity.find_field(&selected.name) {
            Some(Field::Scalar(_)) => false,
            Some(Field::Computed(field)) => !precomputed.contains_key(field.name()),
            Some(Field::Relation(_)) | None => true,
        }
    })
}
