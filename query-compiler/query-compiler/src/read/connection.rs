//! Connection fields, `{field}Connection`: the relationships of a node as a list of edges.
//!
//! ```text
//! CALL {
//!     WITH this
//!     CALL {
//!         WITH this
//!         MATCH (this)<-[this_c_rel:ACTED_IN]-(this_c_node:Actor)
//!         WHERE ..
//!         RETURN { node: this_c_node { .. }, properties: this_c_rel { .. } } AS this_c_edge
//!     }
//!     WITH collect(this_c_edge) AS this_c_edges
//!     WITH this_c_edges, size(this_c_edges) AS this_c_totalCount
//!     CALL {
//!         WITH this_c_edges
//!         UNWIND this_c_edges AS this_c_edge
//!         WITH this_c_edge ORDER BY .. SKIP .. LIMIT ..
//!         RETURN collect(this_c_edge) AS this_c_page
//!     }
//!     RETURN { edges: this_c_page, totalCount: this_c_totalCount } AS this_c
//! }
//! ```
//!
//! Page info and cursors are derived by the caller from `totalCount`, `first` and `after`.

use super::{ProjectionOptions, computed::sort_subqueries, project, utils::sort_direction};
use crate::{
    CompileResult, InputValidationError,
    authorization::authorization_predicates,
    context::Session,
    extractors::{ConnectionArguments, ConnectionSort, extract_connection_args, extract_connection_where},
    input::InputMap,
    operation::{SelectedField, Selection},
    translate::{directed_read, edge_predicate, node_pattern, related_in_direction},
};
use cypher_builder::ast::*;
use query_structure::{
    AuthorizationOperation, EdgeFilter, Entity, FieldContainer, OrderBy, RelationField,
    RelationshipProperties,
};

const EDGE_NODE: &str = "node";
const EDGE_PROPERTIES: &str = "properties";

/// Selections answered by the caller.
const CALLER_FIELDS: [&str; 2] = ["pageInfo", "cursor"];

pub(crate) fn connection_subquery(
    session: &mut Session<'_>,
    parent: &Variable,
    field: &RelationField,
    selected: &SelectedField,
    result: &Variable,
) -> CompileResult<Call> {
    let arguments = &selected.arguments;
    let filter = connection_where(session, arguments, field)?;

    let mut connection_arguments = arguments.clone();
    connection_arguments.shift_remove("directed");
    let args = extract_connection_args(&connection_arguments, field)?;

    let shape = ConnectionShape::parse(field, &selected.selection)?;

    let read = ConnectionRead {
        parent,
        field,
        result,
        filter: &filter,
        args: &args,
        shape: &shape,
        directed: directed_read(field, arguments),
    };

    let body = read.build(session)?;

    Ok(Call::new(body).import(parent))
}

fn connection_where(session: &mut Session<'_>, arguments: &InputMap, field: &RelationField) -> CompileResult<EdgeFilter> {
    match arguments.get("where") {
        Some(value) if !value.is_null() => extract_connection_where(session, value.clone().into_map("where")?, field),
        _ => Ok(EdgeFilter::And(Vec::new())),
    }
}

/// What the selection asks for, by response key.
#[derive(Debug, Default)]
struct ConnectionShape<'s> {
    edges: Option<&'s str>,
    total_count: Option<&'s str>,
    node: Option<&'s SelectedField>,
    properties: Option<&'s SelectedField>,
}

impl<'s> ConnectionShape<'s> {
    fn parse(field: &RelationField, selection: &'s Selection) -> CompileResult<Self> {
        let container = format!("{}Connection", field);
        let mut shape = ConnectionShape::default();

        for selected in selection.fields.iter() {
            match selected.name.as_str() {
                "edges" => {
                    shape.edges.get_or_insert(selected.response_key());

                    for edge_field in selected.selection.fields.iter() {
                        match edge_field.name.as_str() {
                            EDGE_NODE => {
                                shape.node.get_or_insert(edge_field);
                            }
                            EDGE_PROPERTIES if field.properties().is_some() => {
                                shape.properties.get_or_insert(edge_field);
                            }
                            name if CALLER_FIELDS.contains(&name) || name == super::TYPENAME => (),
                            name => return Err(InputValidationError::unknown_field(&format!("{container}.edges"), name).into()),
                        }
                    }
                }
                "totalCount" => {
                    shape.total_count.get_or_insert(selected.response_key());
                }
                name if CALLER_FIELDS.contains(&name) || name == super::TYPENAME => (),
                name => return Err(InputValidationError::unknown_field(&container, name).into()),
            }
        }

        Ok(shape)
    }
}

struct ConnectionRead<'r, 's> {
    parent: &'r Variable,
    field: &'r RelationField,
    result: &'r Variable,
    filter: &'r EdgeFilter,
    args: &'r ConnectionArguments,
    shape: &'r ConnectionShape<'s>,
    directed: bool,
}

impl ConnectionRead<'_, '_> {
    fn build(&self, session: &mut Session<'_>) -> CompileResult<Statement> {
        let edge = self.result.child("edge");
        let edges = self.result.child("edges");
        let total_count = self.result.child("totalCount");
        let page = self.result.child("page");

        let target = self.field.target();
        let mut branches = Vec::new();

        for entity in target.concrete_entities() {
            if let Some(branch) = self.edge_branch(session, &entity, target.is_abstract(), &edge)? {
                branches.push(branch);
            }
        }

        let mut body = Statement::new();

        if branches.is_empty() {
            body.push(With::new().item((Expression::list(Vec::new()), edges.clone())));
        } else {
            body.push(Call::union(branches).import(self.parent));
            body.push(With::new().item((Expression::from(&edge).collect(), edges.clone())));
        }

        body.push(
            With::new()
                .item(&edges)
                .item((Expression::function("size", vec![Expression::from(&edges)]), total_count.clone())),
        );

        let listed = match self.pagination(&edges, &edge) {
            Some(pagination) => {
                let pagination = pagination.with(Return::new().item((Expression::from(&edge).collect(), page.clone())));
                body.push(Call::new(pagination).import(&edges));
                page
            }
            None => edges,
        };

        let mut entries = Vec::new();

        if let Some(key) = self.shape.edges {
            entries.push((key, Expression::from(&listed)));
        }

        if let Some(key) = self.shape.total_count {
            entries.push((key, Expression::from(&total_count)));
        }

        body.push(Return::new().item((Expression::map(entries), self.result.clone())));

        Ok(body)
    }

    /// The edges to one node type, `None` when the filter rules it out.
    fn edge_branch(
        &self,
        session: &mut Session<'_>,
        entity: &Entity,
        tagged: bool,
        edge: &Variable,
    ) -> CompileResult<Option<Statement>> {
        let node = self.result.child("node");
        let rel = self.result.child("rel");

        let predicate = edge_predicate(self.filter, &node, &rel, entity);

        if predicate.is_false() {
            return Ok(None);
        }

        let auth = authorization_predicates(session, entity, AuthorizationOperation::Read, &node)?;
        let pattern = related_in_direction(self.parent, self.field, Some(&rel), node_pattern(&node, entity), self.directed);

        let mut branch = Statement::new().with(
            Match::new(pattern)
                .so_that(predicate)
                .so_that(auth.where_predicate()),
        );

        let node_sorts: Vec<&OrderBy> = self.node_sorts().collect();
        let precomputed = sort_subqueries(session, &mut branch, &node, entity, node_sorts.iter().copied())?;
        let sort_fields: Vec<&str> = node_sorts.iter().map(|o| o.field_name()).collect();

        let mut entries = Vec::with_capacity(2);

        if self.shape.node.is_some() || !sort_fields.is_empty() {
            let fields = self
                .shape
                .node
                .map(|node| node.selection.fields_for(entity.name()))
                .unwrap_or_default();

            let options = ProjectionOptions {
                typename: tagged,
                precomputed: Some(&precomputed),
                sort_fields: &sort_fields,
            };

            let projection = project(session, &node, entity, &fields, &options)?;
            entries.push((EDGE_NODE, projection.push_into(&mut branch, &node)));
        }

        if let Some(properties) = self.field.properties() {
            let edge_sorts: Vec<&str> = self.edge_sorts().map(|o| o.field_name()).collect();

            if self.shape.properties.is_some() || !edge_sorts.is_empty() {
                let items = properties_projection(&rel, &properties, self.shape.properties, &edge_sorts)?;
                entries.push((EDGE_PROPERTIES, Expression::map_projection(&rel, items)));
            }
        }

        branch.push(Return::new().item((Expression::map(entries), edge.clone())));

        Ok(Some(branch))
    }

    fn node_sorts(&self) -> impl Iterator<Item = &OrderBy> {
        self.args.sort.iter().filter_map(|sort| match sort {
            ConnectionSort::Node(order_by) => Some(order_by),
            ConnectionSort::Edge(_) => None,
        })
    }

    fn edge_sorts(&self) -> impl Iterator<Item = &OrderBy> {
        self.args.sort.iter().filter_map(|sort| match sort {
            ConnectionSort::Edge(order_by) => Some(order_by),
            ConnectionSort::Node(_) => None,
        })
    }

    /// `UNWIND edges AS edge WITH edge ORDER BY .. SKIP .. LIMIT ..`, `None` without sorting or
    /// pagination.
    fn pagination(&self, edges: &Variable, edge: &Variable) -> Option<Statement> {
        if self.args.sort.is_empty() && self.args.first.is_none() && self.args.offset.is_none() {
            return None;
        }

        let mut with = With::variables([edge]);

        for sort in self.args.sort.iter() {
            let (side, order_by) = match sort {
                ConnectionSort::Node(order_by) => (EDGE_NODE, order_by),
                ConnectionSort::Edge(order_by) => (EDGE_PROPERTIES, order_by),
            };

            let key = Expression::from(edge).property(side).property(order_by.field_name());
            with = with.order_by(key, sort_direction(order_by.sort_order()));
        }

        if let Some(offset) = self.args.offset {
            with = with.skip(Expression::param(format!("{}_offset", self.result), offset));
        }

        if let Some(first) = self.args.first {
            with = with.limit(Expression::param(format!("{}_first", self.result), first));
        }

        Some(Statement::new().with(Unwind::new(Expression::from(edges), edge)).with(with))
    }
}

/// `rel { .. }` of the selected and sorted relationship properties.
fn properties_projection(
    rel: &Variable,
    properties: &RelationshipProperties,
    selected: Option<&SelectedField>,
    sort_fields: &[&str],
) -> CompileResult<Vec<MapProjectionItem>> {
    let mut items = Vec::new();
    let mut keys = Vec::new();

    let requested = selected
        .into_iter()
        .flat_map(|s| s.selection.fields.iter())
        .map(|f| (f.response_key(), f.name.as_str()))
        .chain(sort_fields.iter().map(|name| (*name, *name)));

    for (key, name) in requested {
        if keys.contains(&key) {
            continue;
        }

        if name == super::TYPENAME {
            items.push(MapProjectionItem::Entry(key.to_owned(), Expression::string(properties.name())));
            keys.push(key);
            continue;
        }

        let field = properties
            .find_scalar_field(name)
            .ok_or_else(|| InputValidationError::unknown_field(properties.name(), name))?;

        if key == field.name() && field.db_name() == field.name() {
            items.push(MapProjectionItem::Property(key.to_owned()));
        } else {
            items.push(MapProjectionItem::Entry(key.to_owned(), rel.property(field.db_name())));
        }

        keys.push(key);
    }

    Ok(items)
}
