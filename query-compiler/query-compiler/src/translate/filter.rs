use super::{has_type, node_pattern, related};
use crate::context::{AUTHENTICATED_PARAM, JWT_PARAM};
use cypher_builder::ast::*;
use graph_value::GraphValue;
use query_structure::*;

/// Translates a filter over the nodes bound to `node`.
///
/// `entity` is the concrete type of `node` when known. Field names are resolved on it, so that
/// interface fields use the property names of the implementation. Type narrowings are resolved
/// against it, or rendered with label guards when it is `None`.
///
/// Parameters are named after the node and the field, e.g. `$this_title`.
pub(crate) fn filter_predicate(filter: &Filter, node: &Variable, entity: Option<&Entity>) -> Predicate {
    match filter {
        Filter::And(filters) => Predicate::and(filters.iter().map(|f| filter_predicate(f, node, entity))),
        Filter::Or(filters) => Predicate::or(filters.iter().map(|f| filter_predicate(f, node, entity))),
        Filter::Not(filters) => Predicate::and(filters.iter().map(|f| filter_predicate(f, node, entity))).not(),
        Filter::Scalar(filter) => scalar_predicate(filter, node, entity),
        Filter::Relation(filter) => relation_predicate(filter, node),
        Filter::Connection(filter) => connection_predicate(filter, node),
        Filter::Aggregation(filter) => aggregation_predicate(filter, node),
        Filter::TypeNarrowing(narrowing) => narrowing_predicate(narrowing, node, entity),
        Filter::Claim(filter) => claim_predicate(filter),
        Filter::Authenticated => Expression::shared_param(AUTHENTICATED_PARAM).equals(Expression::boolean(true)),
        Filter::Never => Predicate::Literal(false),
        Filter::Empty => Predicate::Literal(true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Single,
    List,
}

fn scalar_predicate(filter: &ScalarFilter, node: &Variable, entity: Option<&Entity>) -> Predicate {
    let field = entity
        .and_then(|e| e.find_scalar_field(filter.field.name()))
        .unwrap_or_else(|| filter.field.clone());

    let hint = format!("{node}_{}", field.name());
    let tpe = Some(field.type_identifier());
    let mut property = node.property(field.db_name());

    if let Some(default) = field.coalesce_value() {
        let default = Expression::param(format!("{hint}_default"), default.clone());
        property = Expression::function("coalesce", vec![property, default]);
    }

    let equality_shape = if field.is_list() { Shape::List } else { Shape::Single };

    let predicate = match &filter.condition {
        ScalarCondition::Distance {
            comparison,
            point,
            distance,
        } => {
            let point = Expression::function("point", vec![Expression::param(format!("{hint}_point"), point.clone())]);
            let distance = Expression::param(format!("{hint}_distance"), distance.clone());

            return Expression::function("point.distance", vec![property, point])
                .compare(distance_operator(*comparison), distance);
        }
        condition => condition_predicate(property, condition, &hint, tpe, equality_shape),
    };

    match filter.condition.value() {
        Some(ConditionValue::Claim(path)) => Predicate::and([claim_expression(path).is_not_null(), predicate]),
        _ => predicate,
    }
}

/// `left <op> value` for every condition but distances.
fn condition_predicate(
    left: Expression,
    condition: &ScalarCondition,
    hint: &str,
    tpe: Option<ScalarType>,
    equality_shape: Shape,
) -> Predicate {
    let value = |value: &ConditionValue, shape: Shape| value_expression(value, hint, tpe, shape);

    match condition {
        ScalarCondition::Equals(v) if v.is_null() => left.is_null(),
        ScalarCondition::Equals(v) => left.equals(value(v, equality_shape)),
        ScalarCondition::In(v) => left.in_list(value(v, Shape::List)),
        ScalarCondition::LessThan(v) => left.less_than(value(v, Shape::Single)),
        ScalarCondition::LessThanOrEquals(v) => left.less_than_or_equals(value(v, Shape::Single)),
        ScalarCondition::GreaterThan(v) => left.greater_than(value(v, Shape::Single)),
        ScalarCondition::GreaterThanOrEquals(v) => left.greater_than_or_equals(value(v, Shape::Single)),
        ScalarCondition::Contains(v) => left.compare(CompareOperator::Contains, value(v, Shape::Single)),
        ScalarCondition::StartsWith(v) => left.compare(CompareOperator::StartsWith, value(v, Shape::Single)),
        ScalarCondition::EndsWith(v) => left.compare(CompareOperator::EndsWith, value(v, Shape::Single)),
        ScalarCondition::Matches(v) => left.compare(CompareOperator::Matches, value(v, Shape::Single)),
        ScalarCondition::Includes(v) => value(v, Shape::Single).in_list(left),
        ScalarCondition::Distance { .. } => Predicate::Literal(false),
    }
}

/// The right-hand side of a comparison. Temporal and spatial values are converted from their
/// parameter representation, element-wise for lists.
fn value_expression(value: &ConditionValue, hint: &str, tpe: Option<ScalarType>, shape: Shape) -> Expression {
    let value = match value {
        ConditionValue::Claim(path) => return claim_expression(path),
        ConditionValue::Value(value) => value,
    };

    let param = Expression::param(hint, value.clone());

    let Some(function) = tpe.and_then(conversion) else {
        return param;
    };

    match shape {
        Shape::Single => Expression::function(function, vec![param]),
        Shape::List => {
            let item = Variable::new(format!("{hint}_item"));

            Expression::comprehension(ListComprehension {
                map: Some(Expression::function(function, vec![Expression::from(&item)])),
                variable: item,
                list: param,
                filter: None,
            })
        }
    }
}

fn conversion(tpe: ScalarType) -> Option<&'static str> {
    match tpe {
        ScalarType::DateTime => Some("datetime"),
        ScalarType::Date => Some("date"),
        ScalarType::Point => Some("point"),
        _ => None,
    }
}

/// `$jwt.a.b`
fn claim_expression(path: &[String]) -> Expression {
    path.iter()
        .fold(Expression::shared_param(JWT_PARAM), |expression, key| expression.property(key))
}

fn claim_predicate(filter: &ClaimFilter) -> Predicate {
    let hint = format!("{JWT_PARAM}_{}", filter.path.join("_"));
    condition_predicate(claim_expression(&filter.path), &filter.condition, &hint, None, Shape::Single)
}

fn quantifier_name(condition: RelationCondition) -> &'static str {
    match condition {
        RelationCondition::Some => "some",
        RelationCondition::None => "none",
        RelationCondition::All => "all",
        RelationCondition::Single => "single",
    }
}

fn relation_predicate(filter: &RelationFilter, node: &Variable) -> Predicate {
    let field = &filter.field;
    let target = field.target();
    let base = node.child(format!("{}_{}", field.name(), quantifier_name(filter.condition)));

    let branches = target
        .concrete_entities()
        .into_iter()
        .map(|entity| {
            let variable = if target.is_abstract() {
                base.child(entity.name())
            } else {
                base.clone()
            };

            let pattern = related(node, field, None, node_pattern(&variable, &entity));

            let predicate = match filter.nested.as_ref().clone().narrow_to(&entity) {
                Narrowed::Applies(nested) => filter_predicate(&nested, &variable, Some(&entity)),
                Narrowed::Excluded => Predicate::Literal(false),
            };

            (pattern, predicate)
        })
        .collect();

    quantify(filter.condition, branches)
}

fn connection_predicate(filter: &ConnectionFilter, node: &Variable) -> Predicate {
    let field = &filter.field;
    let target = field.target();
    let base = node.child(format!("{}Connection_{}", field.name(), quantifier_name(filter.condition)));

    let branches = target
        .concrete_entities()
        .into_iter()
        .map(|entity| {
            let variable = if target.is_abstract() {
                base.child(entity.name())
            } else {
                base.clone()
            };

            let rel = variable.child("rel");
            let pattern = related(node, field, Some(&rel), node_pattern(&variable, &entity));
            let predicate = edge_predicate(&filter.nested, &variable, &rel, &entity);

            (pattern, predicate)
        })
        .collect();

    quantify(filter.condition, branches)
}

/// Conditions over a related node bound to `node` and its relationship bound to `rel`.
pub(crate) fn edge_predicate(filter: &EdgeFilter, node: &Variable, rel: &Variable, entity: &Entity) -> Predicate {
    match filter {
        EdgeFilter::And(filters) => Predicate::and(filters.iter().map(|f| edge_predicate(f, node, rel, entity))),
        EdgeFilter::Or(filters) => Predicate::or(filters.iter().map(|f| edge_predicate(f, node, rel, entity))),
        EdgeFilter::Not(inner) => edge_predicate(inner, node, rel, entity).not(),
        EdgeFilter::Node(filter) => match filter.clone().narrow_to(entity) {
            Narrowed::Applies(filter) => filter_predicate(&filter, node, Some(entity)),
            Narrowed::Excluded => Predicate::Literal(false),
        },
        EdgeFilter::Edge(filter) => filter_predicate(filter, rel, None),
    }
}

/// Combines per-type existence checks into the quantifier.
///
/// | Condition | Rendered                                                       |
/// |---        |---                                                             |
/// | Some      | `EXISTS { p WHERE f }` for any type                            |
/// | None      | `NOT EXISTS { p WHERE f }` for every type                      |
/// | All       | `EXISTS { p }` for any type, `NOT EXISTS { p WHERE NOT f }` for every type |
/// | Single    | the `COUNT { p WHERE f }` of all types equals 1               |
fn quantify(condition: RelationCondition, branches: Vec<(Pattern, Predicate)>) -> Predicate {
    let matching = |branches: Vec<(Pattern, Predicate)>| {
        branches
            .into_iter()
            .filter(|(_, predicate)| !predicate.is_false())
            .map(|(pattern, predicate)| PatternSubquery::new(pattern).so_that(predicate))
            .collect::<Vec<_>>()
    };

    match condition {
        RelationCondition::Some => Predicate::or(matching(branches).into_iter().map(Predicate::exists)),
        RelationCondition::None => Predicate::and(matching(branches).into_iter().map(|s| Predicate::exists(s).not())),
        RelationCondition::All => {
            let any = Predicate::or(
                branches
                    .iter()
                    .map(|(pattern, _)| Predicate::exists(PatternSubquery::new(pattern.clone()))),
            );

            let failing = branches
                .into_iter()
                .filter(|(_, predicate)| !predicate.is_true())
                .map(|(pattern, predicate)| Predicate::exists(PatternSubquery::new(pattern).so_that(predicate.not())).not());

            Predicate::and(std::iter::once(any).chain(failing))
        }
        RelationCondition::Single => {
            let total = matching(branches)
                .into_iter()
                .map(Expression::count)
                .reduce(|left, right| left.binary(BinaryOperator::Add, right));

            match total {
                Some(total) => total.equals(Expression::int(1)),
                None => Predicate::Literal(false),
            }
        }
    }
}

fn aggregation_predicate(filter: &AggregationFilter, node: &Variable) -> Predicate {
    let field = &filter.field;
    let hint = format!("{node}_{}Aggregate_count", field.name());

    let total = field
        .target()
        .concrete_entities()
        .into_iter()
        .map(|entity| {
            let target = NodePattern::anonymous().labels(entity.labels().iter().cloned());
            Expression::count(PatternSubquery::new(related(node, field, None, target)))
        })
        .reduce(|left, right| left.binary(BinaryOperator::Add, right))
        .unwrap_or_else(|| Expression::int(0));

    let value = Expression::param(hint, filter.value.clone());

    total.compare(count_operator(filter.comparison), value)
}

fn narrowing_predicate(narrowing: &TypeNarrowingFilter, node: &Variable, entity: Option<&Entity>) -> Predicate {
    if let Some(entity) = entity {
        return match narrowing.branch(entity) {
            Some(filter) => filter_predicate(filter, node, Some(entity)),
            None => Predicate::Literal(!narrowing.exclude_unlisted),
        };
    }

    let mut alternatives: Vec<Predicate> = narrowing
        .branches
        .iter()
        .map(|(entity, filter)| Predicate::and([has_type(node, entity), filter_predicate(filter, node, Some(entity))]))
        .collect();

    if !narrowing.exclude_unlisted {
        let unlisted = Predicate::and(narrowing.branches.iter().map(|(entity, _)| has_type(node, entity).not()));
        alternatives.push(unlisted);
    }

    Predicate::or(alternatives)
}

fn distance_operator(comparison: DistanceComparison) -> CompareOperator {
    match comparison {
        DistanceComparison::Equals => CompareOperator::Equals,
        DistanceComparison::LessThan => CompareOperator::LessThan,
        DistanceComparison::LessThanOrEquals => CompareOperator::LessThanOrEquals,
        DistanceComparison::GreaterThan => CompareOperator::GreaterThan,
        DistanceComparison::GreaterThanOrEquals => CompareOperator::GreaterThanOrEquals,
    }
}

fn count_operator(comparison: CountComparison) -> CompareOperator {
    match comparison {
        CountComparison::Equals => CompareOperator::Equals,
        CountComparison::LessThan => CompareOperator::LessThan,
        CountComparison::LessThanOrEquals => CompareOperator::LessThanOrEquals,
        CountComparison::GreaterThan => CompareOperator::GreaterThan,
        CountComparison::GreaterThanOrEquals => CompareOperator::GreaterThanOrEquals,
    }
}

/// A parameter holding a value written to `field`, converted like the values it is compared with.
pub(crate) fn field_value(field: &ScalarField, hint: &str, value: GraphValue) -> Expression {
    let shape = if field.is_list() { Shape::List } else { Shape::Single };

    value_expression(&ConditionValue::Value(value), hint, Some(field.type_identifier()), shape)
}
