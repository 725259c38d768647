//! Operation input: an ordered tree of maps, lists and scalar values.
//!
//! Key order is significant. Sibling nested writes run in the order their keys appear.

use crate::InputValidationError;
use graph_value::GraphValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type InputMap = IndexMap<String, InputValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Map(InputMap),
    List(Vec<InputValue>),
    Scalar(GraphValue),
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Scalar(GraphValue::Null))
    }

    pub fn as_map(&self) -> Option<&InputMap> {
        match self {
            InputValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&GraphValue> {
        match self {
            InputValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(GraphValue::as_str)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            InputValue::Map(_) => "Object",
            InputValue::List(_) => "List",
            InputValue::Scalar(value) => value.type_name(),
        }
    }

    /// The value as bound in a parameter. Maps become objects, e.g. points.
    pub fn into_value(self) -> GraphValue {
        match self {
            InputValue::Scalar(value) => value,
            InputValue::List(values) => GraphValue::List(values.into_iter().map(InputValue::into_value).collect()),
            InputValue::Map(map) => GraphValue::Object(map.into_iter().map(|(k, v)| (k, v.into_value())).collect()),
        }
    }

    pub(crate) fn into_map(self, path: &str) -> Result<InputMap, InputValidationError> {
        match self {
            InputValue::Map(map) => Ok(map),
            other => Err(InputValidationError::invalid_value(path, "an object", other.type_name())),
        }
    }
}

impl From<GraphValue> for InputValue {
    fn from(value: GraphValue) -> Self {
        match value {
            GraphValue::List(values) => InputValue::List(values.into_iter().map(Into::into).collect()),
            GraphValue::Object(map) => InputValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            scalar => InputValue::Scalar(scalar),
        }
    }
}

impl From<InputMap> for InputValue {
    fn from(map: InputMap) -> Self {
        InputValue::Map(map)
    }
}

impl TryFrom<serde_json::Value> for InputValue {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

/// Lists stay lists, single values become a list of one.
pub(crate) fn coerce_vec(value: InputValue) -> Vec<InputValue> {
    match value {
        InputValue::List(values) => values,
        other => vec![other],
    }
}

/// Converts a JSON object, as found in schema annotations, into an input map.
pub(crate) fn input_map_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Result<InputMap, InputValidationError> {
    serde_json::from_value(serde_json::Value::Object(object.clone()))
        .map_err(|err| InputValidationError::invalid_value(path, "a filter object", err.to_string()))
}
