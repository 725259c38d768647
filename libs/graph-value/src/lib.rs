mod error;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::{convert::TryFrom, fmt};

pub use error::ConversionFailure;
pub type GraphValueResult<T> = std::result::Result<T, ConversionFailure>;
pub type GraphListValue = Vec<GraphValue>;
pub type GraphObjectValue = IndexMap<String, GraphValue>;

/// A literal value that can be bound as a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum GraphValue {
    #[default]
    #[serde(serialize_with = "serialize_null")]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(GraphListValue),

    /// Key order is preserved, maps render and serialize in insertion order.
    Object(GraphObjectValue),
}

fn serialize_null<S>(serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Option::<u8>::None.serialize(serializer)
}

impl GraphValue {
    pub fn object<I, K>(entries: I) -> GraphValue
    where
        I: IntoIterator<Item = (K, GraphValue)>,
        K: Into<String>,
    {
        GraphValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GraphValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GraphValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GraphValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GraphValue::Int(i) => Some(*i as f64),
            GraphValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GraphValue]> {
        match self {
            GraphValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&GraphObjectValue> {
        match self {
            GraphValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<GraphListValue> {
        match self {
            GraphValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Name of the variant, used in conversion errors and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            GraphValue::Null => "null",
            GraphValue::Boolean(_) => "Boolean",
            GraphValue::Int(_) => "Int",
            GraphValue::Float(_) => "Float",
            GraphValue::String(_) => "String",
            GraphValue::List(_) => "List",
            GraphValue::Object(_) => "Object",
        }
    }
}

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Null => "null".fmt(f),
            GraphValue::Boolean(x) => x.fmt(f),
            GraphValue::Int(x) => x.fmt(f),
            GraphValue::Float(x) => x.fmt(f),
            GraphValue::String(x) => write!(f, "\"{x}\""),
            GraphValue::List(x) => {
                let as_string = x.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "[{as_string}]")
            }
            GraphValue::Object(x) => {
                let as_string = x
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{ {as_string} }}")
            }
        }
    }
}

impl TryFrom<serde_json::Value> for GraphValue {
    type Error = ConversionFailure;

    fn try_from(v: serde_json::Value) -> GraphValueResult<Self> {
        match v {
            serde_json::Value::Null => Ok(GraphValue::Null),
            serde_json::Value::Bool(b) => Ok(GraphValue::Boolean(b)),
            serde_json::Value::String(s) => Ok(GraphValue::String(s)),
            serde_json::Value::Number(num) => num
                .as_i64()
                .map(GraphValue::Int)
                .or_else(|| num.as_f64().map(GraphValue::Float))
                .ok_or_else(|| ConversionFailure::new("JSON number", "GraphValue")),
            serde_json::Value::Array(values) => {
                let values: GraphValueResult<GraphListValue> = values.into_iter().map(GraphValue::try_from).collect();
                Ok(GraphValue::List(values?))
            }
            serde_json::Value::Object(obj) => {
                let mut map = GraphObjectValue::with_capacity(obj.len());

                for (k, v) in obj {
                    map.insert(k, GraphValue::try_from(v)?);
                }

                Ok(GraphValue::Object(map))
            }
        }
    }
}

impl From<GraphValue> for serde_json::Value {
    fn from(value: GraphValue) -> Self {
        match value {
            GraphValue::Null => serde_json::Value::Null,
            GraphValue::Boolean(b) => serde_json::Value::Bool(b),
            GraphValue::Int(i) => serde_json::Value::Number(i.into()),
            GraphValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            GraphValue::String(s) => serde_json::Value::String(s),
            GraphValue::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            GraphValue::Object(o) => serde_json::Value::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<bool> for GraphValue {
    fn from(b: bool) -> Self {
        GraphValue::Boolean(b)
    }
}

impl From<i64> for GraphValue {
    fn from(i: i64) -> Self {
        GraphValue::Int(i)
    }
}

impl From<i32> for GraphValue {
    fn from(i: i32) -> Self {
        GraphValue::Int(i64::from(i))
    }
}

impl From<usize> for GraphValue {
    fn from(i: usize) -> Self {
        i64::try_from(i).map(GraphValue::Int).unwrap_or(GraphValue::Float(i as f64))
    }
}

impl From<f64> for GraphValue {
    fn from(f: f64) -> Self {
        GraphValue::Float(f)
    }
}

impl From<&str> for GraphValue {
    fn from(s: &str) -> Self {
        GraphValue::String(s.to_owned())
    }
}

impl From<String> for GraphValue {
    fn from(s: String) -> Self {
        GraphValue::String(s)
    }
}

impl<T> From<Vec<T>> for GraphValue
where
    T: Into<GraphValue>,
{
    fn from(values: Vec<T>) -> Self {
        GraphValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for GraphValue
where
    T: Into<GraphValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(GraphValue::Null)
    }
}
