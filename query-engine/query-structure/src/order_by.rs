use crate::{ComputedField, ScalarField};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortOrder {
    pub fn parse(direction: &str) -> Option<SortOrder> {
        match direction {
            "ASC" => Some(SortOrder::Ascending),
            "DESC" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBy {
    /// A stored property.
    Scalar(OrderByScalar),
    /// A computed field, which has to be evaluated before sorting.
    Computed(OrderByComputed),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByScalar {
    pub field: ScalarField,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByComputed {
    pub field: ComputedField,
    pub sort_order: SortOrder,
}

impl OrderBy {
    pub fn scalar(field: ScalarField, sort_order: SortOrder) -> Self {
        Self::Scalar(OrderByScalar { field, sort_order })
    }

    pub fn computed(field: ComputedField, sort_order: SortOrder) -> Self {
        Self::Computed(OrderByComputed { field, sort_order })
    }

    pub fn sort_order(&self) -> SortOrder {
        match self {
            OrderBy::Scalar(o) => o.sort_order,
            OrderBy::Computed(o) => o.sort_order,
        }
    }

    pub fn field_name(&self) -> &str {
        match self {
            OrderBy::Scalar(o) => o.field.name(),
            OrderBy::Computed(o) => o.field.name(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, OrderBy::Computed(_))
    }
}
