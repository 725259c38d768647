//! Relationship cardinality checks.
//!
//! Writes may leave a singular or required relationship with the wrong number of edges. After
//! writing a node, each constrained relationship it may have changed is counted:
//!
//! ```text
//! CALL apoc.util.validate(
//!     NOT (COUNT { MATCH (this0)<-[:DIRECTED]-(:Person) } = 1),
//!     "RELATIONSHIP_CARDINALITY: Movie.director required exactly once",
//!     [0]
//! )
//! ```

use crate::{RuntimeViolation, context::Session, translate::relationship};
use cypher_builder::ast::*;
use query_structure::{Cardinality, CompositeType, Entity, FieldContainer, RelationDirection, RelationField};

/// One check per constrained field of `fields`, in order. Nothing when checks are disabled.
pub(crate) fn cardinality_checks(
    session: &Session<'_>,
    node: &Variable,
    fields: impl IntoIterator<Item = RelationField>,
) -> Vec<CallProcedure> {
    if !session.config.validate_cardinality {
        return Vec::new();
    }

    let mut checked: Vec<RelationField> = Vec::new();

    for field in fields {
        if field.cardinality().is_constrained() && !checked.contains(&field) {
            checked.push(field);
        }
    }

    checked.iter().map(|field| cardinality_check(node, field)).collect()
}

fn cardinality_check(node: &Variable, field: &RelationField) -> CallProcedure {
    let target = field.target();
    let related = node.child(format!("{}_related", field.name()));

    let (to, guard) = match &target {
        CompositeType::Entity(entity) => (NodePattern::anonymous().labels(entity.labels().iter().cloned()), None),
        target => {
            let guards = target
                .concrete_entities()
                .iter()
                .map(|entity| related.has_labels(entity.labels().iter().cloned()))
                .collect::<Vec<_>>();

            (NodePattern::new(&related), Some(Predicate::or(guards)))
        }
    };

    let pattern = Pattern::node(NodePattern::new(node)).related(relationship(field, true), to);

    let mut subquery = PatternSubquery::new(pattern);

    if let Some(guard) = guard {
        subquery = subquery.so_that(guard);
    }

    let count = Expression::count(subquery);

    let holds = match field.cardinality() {
        Cardinality::ExactlyOne => count.equals(Expression::int(1)),
        Cardinality::AtMostOne => count.less_than_or_equals(Expression::int(1)),
        Cardinality::AtLeastOne => count.greater_than_or_equals(Expression::int(1)),
        Cardinality::Many => Predicate::Literal(true),
    };

    let message = format!(
        "{}: {} {}",
        RuntimeViolation::RelationshipCardinality.identifier(),
        field,
        field.cardinality().describe()
    );

    CallProcedure::new(
        "apoc.util.validate",
        vec![
            Expression::from(holds.not()),
            Expression::string(message),
            Expression::list(vec![Expression::int(0)]),
        ],
    )
}

/// Fields of `entity` for the same relationship as `field`, seen from the other end. Connecting
/// through `field` adds an edge to them too.
pub(crate) fn inverse_fields(field: &RelationField, entity: &Entity) -> Vec<RelationField> {
    let opposite = match field.direction() {
        RelationDirection::Out => RelationDirection::In,
        RelationDirection::In => RelationDirection::Out,
    };

    entity
        .relation_fields()
        .into_iter()
        .filter(|candidate| candidate.rel_type() == field.rel_type() && candidate.direction() == opposite)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompilerConfig, RequestContext, SchemaAuthorization, test_schema};
    use cypher_builder::visitor::{Cypher, Visitor};
    use pretty_assertions::assert_eq;

    #[test]
    fn required_singular_relationships_are_counted() {
        let schema = test_schema::movies();
        let movie = schema.entity_by_name("Movie").unwrap();
        let config = CompilerConfig::default();
        let request = RequestContext::anonymous();
        let session = Session::new(&schema, &config, &SchemaAuthorization, &request);
        let node = Variable::new("this0");

        let checks = cardinality_checks(&session, &node, movie.relation_fields());
        assert_eq!(1, checks.len());

        let statement = Statement::new()
            .with(Create::new(NodePattern::new(&node).label("Movie")))
            .with(checks[0].clone());

        let (cypher, _) = Cypher::build(&statement, &Default::default()).unwrap();

        assert!(cypher.contains("NOT (COUNT { MATCH (this0)<-[:DIRECTED]-(:Person) } = 1)"), "{cypher}");
        assert!(cypher.contains("\"RELATIONSHIP_CARDINALITY: Movie.director required exactly once\""), "{cypher}");
    }

    #[test]
    fn checks_can_be_disabled() {
        let schema = test_schema::movies();
        let movie = schema.entity_by_name("Movie").unwrap();
        let config = CompilerConfig::builder().validate_cardinality(false).build();
        let request = RequestContext::anonymous();
        let session = Session::new(&schema, &config, &SchemaAuthorization, &request);

        assert!(cardinality_checks(&session, &Variable::new("this0"), movie.relation_fields()).is_empty());
    }

    #[test]
    fn inverse_fields_share_the_relationship_type() {
        let schema = test_schema::movies();
        let user = schema.entity_by_name("User").unwrap();
        let post = schema.entity_by_name("Post").unwrap();
        let posts = user.find_relation_field("posts").unwrap();

        let inverse: Vec<String> = inverse_fields(&posts, &post).iter().map(ToString::to_string).collect();

        assert_eq!(vec!["Post.creator".to_owned()], inverse);
    }
}
