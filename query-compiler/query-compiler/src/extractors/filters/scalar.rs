use super::{CLAIM_PREFIX, FilterExtractor};
use crate::{
    CompileResult, InputValidationError,
    input::{InputMap, InputValue, coerce_vec},
};
use graph_value::GraphValue;
use query_structure::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ScalarOperator {
    Equals,
    Not,
    In,
    NotIn,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Matches,
    Includes,
    NotIncludes,
    Distance,
}

/// Operator suffixes, longest first so that `_NOT_IN` wins over `_IN`.
pub(super) const OPERATORS: &[(&str, ScalarOperator)] = &[
    ("_NOT_STARTS_WITH", ScalarOperator::NotStartsWith),
    ("_NOT_ENDS_WITH", ScalarOperator::NotEndsWith),
    ("_NOT_CONTAINS", ScalarOperator::NotContains),
    ("_NOT_INCLUDES", ScalarOperator::NotIncludes),
    ("_STARTS_WITH", ScalarOperator::StartsWith),
    ("_ENDS_WITH", ScalarOperator::EndsWith),
    ("_NOT_IN", ScalarOperator::NotIn),
    ("_CONTAINS", ScalarOperator::Contains),
    ("_INCLUDES", ScalarOperator::Includes),
    ("_MATCHES", ScalarOperator::Matches),
    ("_DISTANCE", ScalarOperator::Distance),
    ("_NOT", ScalarOperator::Not),
    ("_LTE", ScalarOperator::LessThanOrEquals),
    ("_GTE", ScalarOperator::GreaterThanOrEquals),
    ("_IN", ScalarOperator::In),
    ("_LT", ScalarOperator::LessThan),
    ("_GT", ScalarOperator::GreaterThan),
];

impl ScalarOperator {
    fn accepts(self, tpe: ScalarType, list: bool) -> bool {
        use ScalarOperator::*;

        match self {
            Equals | Not => true,
            Includes | NotIncludes => list,
            _ if list => false,
            In | NotIn => tpe != ScalarType::Point,
            LessThan | LessThanOrEquals | GreaterThan | GreaterThanOrEquals => {
                tpe.is_orderable() || tpe == ScalarType::Point
            }
            Contains | NotContains | StartsWith | NotStartsWith | EndsWith | NotEndsWith | Matches => {
                tpe.is_string_like()
            }
            Distance => tpe == ScalarType::Point,
        }
    }

    fn is_negated(self) -> bool {
        use ScalarOperator::*;
        matches!(self, Not | NotIn | NotContains | NotStartsWith | NotEndsWith | NotIncludes)
    }

    fn distance_comparison(self) -> Option<DistanceComparison> {
        let comparison = match self {
            ScalarOperator::Distance => DistanceComparison::Equals,
            ScalarOperator::LessThan => DistanceComparison::LessThan,
            ScalarOperator::LessThanOrEquals => DistanceComparison::LessThanOrEquals,
            ScalarOperator::GreaterThan => DistanceComparison::GreaterThan,
            ScalarOperator::GreaterThanOrEquals => DistanceComparison::GreaterThanOrEquals,
            _ => return None,
        };

        Some(comparison)
    }

    /// The positive condition. Negated operators wrap it in a `NOT`.
    fn condition(self, value: ConditionValue) -> ScalarCondition {
        use ScalarOperator::*;

        match self {
            Equals | Not => ScalarCondition::Equals(value),
            In | NotIn => ScalarCondition::In(value),
            LessThan => ScalarCondition::LessThan(value),
            LessThanOrEquals => ScalarCondition::LessThanOrEquals(value),
            GreaterThan => ScalarCondition::GreaterThan(value),
            GreaterThanOrEquals => ScalarCondition::GreaterThanOrEquals(value),
            Contains | NotContains => ScalarCondition::Contains(value),
            StartsWith | NotStartsWith => ScalarCondition::StartsWith(value),
            EndsWith | NotEndsWith => ScalarCondition::EndsWith(value),
            Matches => ScalarCondition::Matches(value),
            Includes | NotIncludes | Distance => ScalarCondition::Includes(value),
        }
    }
}

impl FilterExtractor<'_, '_> {
    pub(super) fn scalar_filter(
        &mut self,
        field: ScalarField,
        operator: ScalarOperator,
        key: &str,
        value: InputValue,
    ) -> CompileResult<Filter> {
        let path = format!("{}.{key}", field.container_name());
        let tpe = field.type_identifier();

        if !operator.accepts(tpe, field.is_list()) {
            return Err(InputValidationError::InvalidOperator {
                field: field.to_string(),
                operator: key.trim_start_matches(field.name()).to_owned(),
            }
            .into());
        }

        if operator.is_negated() {
            self.session.deprecated(format!(
                "`{path}` is deprecated, use `NOT: {{ {} }}` instead.",
                field.name()
            ));
        }

        let condition = match (tpe, operator.distance_comparison()) {
            (ScalarType::Point, Some(comparison)) => distance_condition(&path, comparison, value)?,
            _ => {
                let value = self.condition_value(&path, &field, operator, value)?;
                operator.condition(value)
            }
        };

        let filter = Filter::from(ScalarFilter { field, condition });

        if operator.is_negated() {
            Ok(Filter::not(vec![filter]))
        } else {
            Ok(filter)
        }
    }

    fn condition_value(
        &mut self,
        path: &str,
        field: &ScalarField,
        operator: ScalarOperator,
        value: InputValue,
    ) -> CompileResult<ConditionValue> {
        if let Some(claim) = self.claim_reference(&value) {
            return Ok(claim);
        }

        let tpe = field.type_identifier();

        match operator {
            ScalarOperator::Equals | ScalarOperator::Not if value.is_null() => Ok(ConditionValue::Value(GraphValue::Null)),
            ScalarOperator::Equals | ScalarOperator::Not if field.is_list() => {
                let InputValue::List(items) = value else {
                    return Err(InputValidationError::invalid_value(path, "a list", value.type_name()).into());
                };

                let items = items
                    .into_iter()
                    .map(|item| typed_value(path, tpe, item))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ConditionValue::Value(GraphValue::List(items)))
            }
            ScalarOperator::In | ScalarOperator::NotIn => {
                let InputValue::List(items) = value else {
                    return Err(InputValidationError::invalid_value(path, "a list", value.type_name()).into());
                };

                let items = items
                    .into_iter()
                    .map(|item| typed_value(path, tpe, item))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ConditionValue::Value(GraphValue::List(items)))
            }
            _ => Ok(ConditionValue::Value(typed_value(path, tpe, value)?)),
        }
    }

    /// `"$jwt.a.b"` in rule filters refers to the claim `a.b` of the request token.
    fn claim_reference(&self, value: &InputValue) -> Option<ConditionValue> {
        if !self.claims {
            return None;
        }

        let path = value.as_str()?.strip_prefix(CLAIM_PREFIX)?;
        Some(ConditionValue::Claim(path.split('.').map(str::to_owned).collect()))
    }

    /// Filters over the claims of the request. Keys are claim paths with operator suffixes.
    pub(super) fn extract_claims(&mut self, map: InputMap) -> CompileResult<Filter> {
        let mut filters = Vec::with_capacity(map.len());

        for (key, value) in map {
            let filter = match key.as_str() {
                "AND" | "OR" => {
                    let nested = coerce_vec(value)
                        .into_iter()
                        .map(|value| self.extract_claims(value.into_map(&key)?))
                        .collect::<CompileResult<Vec<_>>>()?;

                    match (key.as_str(), nested.is_empty()) {
                        (_, true) => Filter::Empty,
                        ("AND", false) => Filter::and(nested),
                        _ => Filter::or(nested),
                    }
                }
                "NOT" => {
                    let nested = self.extract_claims(value.into_map("NOT")?)?;

                    if nested.is_empty() {
                        Filter::Empty
                    } else {
                        Filter::not(vec![nested])
                    }
                }
                _ => claim_filter(&key, value)?,
            };

            filters.push(filter);
        }

        Ok(Filter::and(filters))
    }
}

fn claim_filter(key: &str, value: InputValue) -> CompileResult<Filter> {
    let (claim, operator) = OPERATORS
        .iter()
        .find_map(|(suffix, operator)| key.strip_suffix(suffix).map(|claim| (claim, *operator)))
        .unwrap_or((key, ScalarOperator::Equals));

    if operator == ScalarOperator::Distance {
        return Err(InputValidationError::InvalidOperator {
            field: format!("jwt.{claim}"),
            operator: String::from("_DISTANCE"),
        }
        .into());
    }

    let path = claim.split('.').map(str::to_owned).collect();
    let condition = operator.condition(ConditionValue::Value(value.into_value()));
    let filter = Filter::from(ClaimFilter { path, condition });

    if operator.is_negated() {
        Ok(Filter::not(vec![filter]))
    } else {
        Ok(filter)
    }
}

/// `{ point: { longitude, latitude }, distance }`
fn distance_condition(path: &str, comparison: DistanceComparison, value: InputValue) -> CompileResult<ScalarCondition> {
    let mut map = value.into_map(path)?;

    let point = match map.shift_remove("point") {
        Some(point @ InputValue::Map(_)) => point.into_value(),
        Some(other) => return Err(InputValidationError::invalid_value(path, "a point", other.type_name()).into()),
        None => return Err(InputValidationError::invalid_value(path, "`point` and `distance`", "no point").into()),
    };

    let distance = match map.shift_remove("distance") {
        Some(InputValue::Scalar(distance @ (GraphValue::Int(_) | GraphValue::Float(_)))) => distance,
        Some(other) => return Err(InputValidationError::invalid_value(path, "a number", other.type_name()).into()),
        None => return Err(InputValidationError::invalid_value(path, "`point` and `distance`", "no distance").into()),
    };

    if let Some(key) = map.keys().next() {
        return Err(InputValidationError::invalid_value(path, "`point` and `distance`", format!("`{key}`")).into());
    }

    Ok(ScalarCondition::Distance {
        comparison,
        point,
        distance,
    })
}

/// Checks that an input value fits a scalar type.
pub(crate) fn typed_value(path: &str, tpe: ScalarType, value: InputValue) -> Result<GraphValue, InputValidationError> {
    let fits = match (tpe, &value) {
        (ScalarType::Point, InputValue::Map(_)) => true,
        (_, InputValue::Scalar(scalar)) => matches!(
            (tpe, scalar),
            (ScalarType::Id, GraphValue::String(_) | GraphValue::Int(_))
                | (ScalarType::String, GraphValue::String(_))
                | (ScalarType::Int, GraphValue::Int(_))
                | (ScalarType::Float, GraphValue::Int(_) | GraphValue::Float(_))
                | (ScalarType::Boolean, GraphValue::Boolean(_))
                | (ScalarType::BigInt, GraphValue::Int(_) | GraphValue::String(_))
                | (ScalarType::DateTime | ScalarType::Date, GraphValue::String(_))
        ),
        _ => false,
    };

    if fits {
        Ok(value.into_value())
    } else {
        Err(InputValidationError::invalid_value(path, type_label(tpe), value.type_name()))
    }
}

pub(crate) fn type_label(tpe: ScalarType) -> &'static str {
    match tpe {
        ScalarType::Id => "ID",
        ScalarType::String => "String",
        ScalarType::Int => "Int",
        ScalarType::Float => "Float",
        ScalarType::Boolean => "Boolean",
        ScalarType::BigInt => "BigInt",
        ScalarType::DateTime => "DateTime",
        ScalarType::Date => "Date",
        ScalarType::Point => "Point",
    }
}
