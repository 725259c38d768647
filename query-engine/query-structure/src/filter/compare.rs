use super::*;

use crate::{RelationField, ScalarField};

/// Comparing methods for scalar fields.
pub trait ScalarCompare {
    fn equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn not_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn is_in<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn less_than<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn less_than_or_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn greater_than<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn greater_than_or_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn contains<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn starts_with<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn ends_with<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;

    fn includes<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>;
}

/// Comparison methods for relational fields.
pub trait RelationCompare {
    fn some_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>;

    fn no_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>;

    fn every_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>;

    fn single_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>;

    fn one_relation_is_null(&self) -> Filter;
}

impl ScalarCompare for ScalarField {
    fn equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::Equals(val.into()))
    }

    fn not_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        Filter::not(vec![self.equals(val)])
    }

    fn is_in<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::In(val.into()))
    }

    fn less_than<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::LessThan(val.into()))
    }

    fn less_than_or_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::LessThanOrEquals(val.into()))
    }

    fn greater_than<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::GreaterThan(val.into()))
    }

    fn greater_than_or_equals<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::GreaterThanOrEquals(val.into()))
    }

    fn contains<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::Contains(val.into()))
    }

    fn starts_with<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::StartsWith(val.into()))
    }

    fn ends_with<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::EndsWith(val.into()))
    }

    fn includes<T>(&self, val: T) -> Filter
    where
        T: Into<ConditionValue>,
    {
        scalar(self, ScalarCondition::Includes(val.into()))
    }
}

fn scalar(field: &ScalarField, condition: ScalarCondition) -> Filter {
    Filter::from(ScalarFilter {
        field: field.clone(),
        condition,
    })
}

impl RelationCompare for RelationField {
    fn some_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>,
    {
        relation(self, RelationCondition::Some, filter.into())
    }

    fn no_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>,
    {
        relation(self, RelationCondition::None, filter.into())
    }

    fn every_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>,
    {
        relation(self, RelationCondition::All, filter.into())
    }

    fn single_related<T>(&self, filter: T) -> Filter
    where
        T: Into<Filter>,
    {
        relation(self, RelationCondition::Single, filter.into())
    }

    fn one_relation_is_null(&self) -> Filter {
        relation(self, RelationCondition::None, Filter::Empty)
    }
}

fn relation(field: &RelationField, condition: RelationCondition, nested: Filter) -> Filter {
    Filter::from(RelationFilter {
        field: field.clone(),
        condition,
        nested: Box::new(nested),
    })
}
