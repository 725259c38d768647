mod computed;
mod relation;
mod scalar;

pub use computed::*;
pub use relation::*;
pub use scalar::*;

use crate::ContainerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Scalar(ScalarField),
    Relation(RelationField),
    Computed(ComputedField),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Scalar(sf) => sf.name(),
            Field::Relation(rf) => rf.name(),
            Field::Computed(cf) => cf.name(),
        }
    }

    pub fn container(&self) -> ContainerId {
        match self {
            Field::Scalar(sf) => sf.id.container,
            Field::Relation(rf) => rf.id.container,
            Field::Computed(cf) => cf.id.container,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            Field::Scalar(sf) => Some(sf),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationField> {
        match self {
            Field::Relation(rf) => Some(rf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "ID")]
    Id,
    String,
    Int,
    Float,
    Boolean,
    BigInt,
    DateTime,
    Date,
    Point,
}

impl ScalarType {
    pub fn parse(name: &str) -> Option<ScalarType> {
        let tpe = match name {
            "ID" => ScalarType::Id,
            "String" => ScalarType::String,
            "Int" => ScalarType::Int,
            "Float" => ScalarType::Float,
            "Boolean" => ScalarType::Boolean,
            "BigInt" => ScalarType::BigInt,
            "DateTime" => ScalarType::DateTime,
            "Date" => ScalarType::Date,
            "Point" => ScalarType::Point,
            _ => return None,
        };

        Some(tpe)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, ScalarType::Id | ScalarType::String)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float | ScalarType::BigInt)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ScalarType::DateTime | ScalarType::Date)
    }

    pub fn is_orderable(self) -> bool {
        self.is_numeric() || self.is_temporal() || self.is_string_like()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampOperation {
    Create,
    Update,
}
