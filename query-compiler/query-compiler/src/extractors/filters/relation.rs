use super::{FilterExtractor, FilterTarget};
use crate::{
    CompileResult, InputValidationError,
    input::{InputMap, InputValue, coerce_vec},
};
use graph_value::GraphValue;
use query_structure::*;

pub(super) const QUANTIFIERS: [&str; 4] = ["_SOME", "_NONE", "_ALL", "_SINGLE"];

const COUNT_OPERATORS: [(&str, CountComparison); 5] = [
    ("count", CountComparison::Equals),
    ("count_LT", CountComparison::LessThan),
    ("count_LTE", CountComparison::LessThanOrEquals),
    ("count_GT", CountComparison::GreaterThan),
    ("count_GTE", CountComparison::GreaterThanOrEquals),
];

impl FilterExtractor<'_, '_> {
    /// `actors_SOME: { .. }`, `director: { .. }`, `director: null`.
    pub(super) fn relation_filter(
        &mut self,
        field: RelationField,
        key: &str,
        suffix: Option<&str>,
        value: InputValue,
    ) -> CompileResult<Filter> {
        let condition = self.relation_condition(&field, key, suffix)?;

        // `field: null` asks for the absence of related nodes, `field_NOT: null` for their presence.
        if value.is_null() {
            let condition = match condition {
                RelationCondition::None => RelationCondition::Some,
                _ => RelationCondition::None,
            };

            return Ok(Filter::from(RelationFilter {
                field,
                condition,
                nested: Box::new(Filter::Empty),
            }));
        }

        let target = FilterTarget::from(field.target());
        let nested = self.extract(value.into_map(key)?, &target)?;

        Ok(Filter::from(RelationFilter {
            field,
            condition,
            nested: Box::new(nested),
        }))
    }

    /// `actorsConnection_SOME: { node: { .. }, edge: { .. } }`
    pub(super) fn connection_filter(
        &mut self,
        field: RelationField,
        key: &str,
        suffix: Option<&str>,
        value: InputValue,
    ) -> CompileResult<Filter> {
        let condition = self.relation_condition(&field, key, suffix)?;

        if value.is_null() {
            return Ok(Filter::from(RelationFilter {
                field,
                condition: RelationCondition::None,
                nested: Box::new(Filter::Empty),
            }));
        }

        let nested = self.extract_edge_filter(&field, key, value.into_map(key)?)?;

        Ok(Filter::from(ConnectionFilter {
            field,
            condition,
            nested: Box::new(nested),
        }))
    }

    fn relation_condition(&mut self, field: &RelationField, key: &str, suffix: Option<&str>) -> CompileResult<RelationCondition> {
        let path = format!("{}.{key}", field.container_name());

        match suffix {
            None if field.is_list() => {
                self.session
                    .deprecated(format!("`{path}` is deprecated, use `{key}_SOME` instead."));

                Ok(RelationCondition::Some)
            }
            None => Ok(RelationCondition::Some),
            Some("_NOT") => {
                let base = key.trim_end_matches("_NOT");

                if field.is_list() {
                    self.session
                        .deprecated(format!("`{path}` is deprecated, use `{base}_NONE` instead."));
                } else {
                    self.session
                        .deprecated(format!("`{path}` is deprecated, use `NOT: {{ {base}: .. }}` instead."));
                }

                Ok(RelationCondition::None)
            }
            Some(suffix) => match RelationCondition::from_suffix(suffix) {
                Some(condition) if field.is_list() => Ok(condition),
                _ => Err(InputValidationError::InvalidOperator {
                    field: field.to_string(),
                    operator: suffix.to_owned(),
                }
                .into()),
            },
        }
    }

    /// Combines conditions over the related node (`node`) and the relationship properties
    /// (`edge`).
    pub(super) fn extract_edge_filter(&mut self, field: &RelationField, key: &str, map: InputMap) -> CompileResult<EdgeFilter> {
        let mut filters = Vec::with_capacity(map.len());

        for (edge_key, value) in map {
            let filter = match edge_key.as_str() {
                "AND" | "OR" => {
                    let nested = coerce_vec(value)
                        .into_iter()
                        .map(|value| self.extract_edge_filter(field, key, value.into_map(&edge_key)?))
                        .collect::<CompileResult<Vec<_>>>()?;

                    if edge_key == "AND" {
                        EdgeFilter::And(nested)
                    } else {
                        EdgeFilter::Or(nested)
                    }
                }
                "NOT" => EdgeFilter::Not(Box::new(self.extract_edge_filter(field, key, value.into_map("NOT")?)?)),
                "node" => {
                    let target = FilterTarget::from(field.target());
                    EdgeFilter::Node(self.extract(value.into_map("node")?, &target)?)
                }
                "edge" => {
                    let Some(properties) = field.properties() else {
                        return Err(InputValidationError::UnknownFilter {
                            container: format!("{}.{key}", field.container_name()),
                            key: edge_key,
                        }
                        .into());
                    };

                    let target = FilterTarget::Properties(properties);
                    EdgeFilter::Edge(self.extract(value.into_map("edge")?, &target)?)
                }
                _ => {
                    return Err(InputValidationError::UnknownFilter {
                        container: format!("{}.{key}", field.container_name()),
                        key: edge_key,
                    }
                    .into());
                }
            };

            filters.push(filter);
        }

        Ok(EdgeFilter::and(filters))
    }

    /// `actorsAggregate: { count_GT: 2 }`
    pub(super) fn aggregation_filter(&mut self, field: RelationField, key: &str, value: InputValue) -> CompileResult<Filter> {
        let path = format!("{}.{key}", field.container_name());
        let mut filters = Vec::new();

        for (aggregate_key, value) in value.into_map(key)? {
            let Some((_, comparison)) = COUNT_OPERATORS.iter().find(|(name, _)| *name == aggregate_key) else {
                return Err(
                    InputValidationError::unsupported(&aggregate_key, &path, "only `count` aggregations can be filtered")
                        .into(),
                );
            };

            let value = match value {
                InputValue::Scalar(count @ GraphValue::Int(_)) => count,
                other => {
                    return Err(
                        InputValidationError::invalid_value(format!("{path}.{aggregate_key}"), "Int", other.type_name())
                            .into(),
                    );
                }
            };

            filters.push(Filter::from(AggregationFilter {
                field: field.clone(),
                comparison: *comparison,
                value,
            }));
        }

        Ok(Filter::and(filters))
    }
}
