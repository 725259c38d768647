use crate::ScalarField;
use graph_value::GraphValue;

/// Right-hand side of a scalar comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Value(GraphValue),
    /// A claim of the request token, addressed by its path. Only used by authorization rules.
    Claim(Vec<String>),
}

impl ConditionValue {
    pub fn value(&self) -> Option<&GraphValue> {
        match self {
            ConditionValue::Value(v) => Some(v),
            ConditionValue::Claim(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConditionValue::Value(GraphValue::Null))
    }
}

impl From<GraphValue> for ConditionValue {
    fn from(value: GraphValue) -> Self {
        ConditionValue::Value(value)
    }
}

macro_rules! condition_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ConditionValue {
                fn from(value: $t) -> Self {
                    ConditionValue::Value(GraphValue::from(value))
                }
            }
        )*
    };
}

condition_value_from!(bool, i64, i32, f64, &str, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceComparison {
    Equals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarCondition {
    /// Equality. Comparing with `null` is a null check.
    Equals(ConditionValue),
    In(ConditionValue),
    LessThan(ConditionValue),
    LessThanOrEquals(ConditionValue),
    GreaterThan(ConditionValue),
    GreaterThanOrEquals(ConditionValue),
    Contains(ConditionValue),
    StartsWith(ConditionValue),
    EndsWith(ConditionValue),
    /// Regular expression match.
    Matches(ConditionValue),
    /// The list field contains the value.
    Includes(ConditionValue),
    /// Compares the distance between the point field and `point` with `distance`.
    Distance {
        comparison: DistanceComparison,
        point: GraphValue,
        distance: GraphValue,
    },
}

impl ScalarCondition {
    pub fn value(&self) -> Option<&ConditionValue> {
        match self {
            ScalarCondition::Equals(v)
            | ScalarCondition::In(v)
            | ScalarCondition::LessThan(v)
            | ScalarCondition::LessThanOrEquals(v)
            | ScalarCondition::GreaterThan(v)
            | ScalarCondition::GreaterThanOrEquals(v)
            | ScalarCondition::Contains(v)
            | ScalarCondition::StartsWith(v)
            | ScalarCondition::EndsWith(v)
            | ScalarCondition::Matches(v)
            | ScalarCondition::Includes(v) => Some(v),
            ScalarCondition::Distance { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFilter {
    pub field: ScalarField,
    pub condition: ScalarCondition,
}

/// Condition over a claim of the request token.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimFilter {
    pub path: Vec<String>,
    pub condition: ScalarCondition,
}
