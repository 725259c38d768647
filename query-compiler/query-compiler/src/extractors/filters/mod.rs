mod relation;
mod scalar;

pub(crate) use self::scalar::{type_label, typed_value};

use self::scalar::ScalarOperator;
use crate::{
    CompileResult, InputValidationError,
    context::Session,
    input::{InputMap, InputValue, coerce_vec},
};
use query_structure::*;

/// What a filter input is written against.
#[derive(Debug, Clone)]
pub(crate) enum FilterTarget {
    Entity(Entity),
    Interface(Interface),
    Union(Union),
    Properties(RelationshipProperties),
}

impl FilterTarget {
    pub(crate) fn name(&self) -> &str {
        match self {
            FilterTarget::Entity(e) => e.name(),
            FilterTarget::Interface(i) => i.name(),
            FilterTarget::Union(u) => u.name(),
            FilterTarget::Properties(p) => p.name(),
        }
    }

    fn container(&self) -> Option<&dyn FieldContainer> {
        match self {
            FilterTarget::Entity(e) => Some(e),
            FilterTarget::Interface(i) => Some(i),
            FilterTarget::Properties(p) => Some(p),
            FilterTarget::Union(_) => None,
        }
    }
}

impl From<CompositeType> for FilterTarget {
    fn from(target: CompositeType) -> Self {
        match target {
            CompositeType::Entity(e) => FilterTarget::Entity(e),
            CompositeType::Interface(i) => FilterTarget::Interface(i),
            CompositeType::Union(u) => FilterTarget::Union(u),
        }
    }
}

impl From<Entity> for FilterTarget {
    fn from(entity: Entity) -> Self {
        FilterTarget::Entity(entity)
    }
}

/// Extracts a filter input, the `where` of reads and writes.
pub(crate) fn extract_filter(session: &mut Session<'_>, map: InputMap, target: &FilterTarget) -> CompileResult<Filter> {
    FilterExtractor { session, claims: false }.extract(map, target)
}

/// Extracts the node filter of an authorization rule, where `"$jwt.<claim>"` strings refer to
/// token claims.
pub(crate) fn extract_rule_filter(session: &mut Session<'_>, map: InputMap, entity: &Entity) -> CompileResult<Filter> {
    FilterExtractor { session, claims: true }.extract(map, &FilterTarget::Entity(entity.clone()))
}

/// Extracts a filter over the token claims of the request.
pub(crate) fn extract_claims_filter(session: &mut Session<'_>, map: InputMap) -> CompileResult<Filter> {
    FilterExtractor { session, claims: true }.extract_claims(map)
}

/// Extracts the `where` of a connection field: `{ node: { .. }, edge: { .. } }`.
pub(crate) fn extract_connection_where(
    session: &mut Session<'_>,
    map: InputMap,
    field: &RelationField,
) -> CompileResult<EdgeFilter> {
    let key = format!("{}Connection", field.name());
    FilterExtractor { session, claims: false }.extract_edge_filter(field, &key, map)
}

/// Prefix of claim references in authorization rules.
const CLAIM_PREFIX: &str = "$jwt.";

struct FilterExtractor<'s, 'a> {
    session: &'s mut Session<'a>,
    claims: bool,
}

impl FilterExtractor<'_, '_> {
    /// Rules for the combinators:
    ///
    /// | Name | 0 filters    | n filters         |
    /// |---   |---           |---                |
    /// | AND  | no condition | all must match    |
    /// | OR   | no condition | one must match    |
    /// | NOT  | no condition | negated condition |
    fn extract(&mut self, map: InputMap, target: &FilterTarget) -> CompileResult<Filter> {
        if let FilterTarget::Union(union) = target {
            return self.extract_union(map, union);
        }

        let mut filters = Vec::with_capacity(map.len());

        for (key, value) in map {
            let filter = match key.as_str() {
                "AND" | "OR" => {
                    let nested = self.extract_group(&key, value, target)?;

                    match (key.as_str(), nested.is_empty()) {
                        (_, true) => Filter::Empty,
                        ("AND", false) => Filter::and(nested),
                        _ => Filter::or(nested),
                    }
                }
                "NOT" => {
                    let nested = self.extract(value.into_map("NOT")?, target)?;

                    if nested.is_empty() {
                        Filter::Empty
                    } else {
                        Filter::not(vec![nested])
                    }
                }
                "_on" => match target {
                    FilterTarget::Interface(interface) => self.extract_narrowing(value, interface)?,
                    _ => return Err(unknown_filter(target, &key)),
                },
                _ => self.extract_field(&key, value, target)?,
            };

            filters.push(filter);
        }

        Ok(Filter::and(filters))
    }

    fn extract_group(&mut self, key: &str, value: InputValue, target: &FilterTarget) -> CompileResult<Vec<Filter>> {
        coerce_vec(value)
            .into_iter()
            .map(|value| self.extract(value.into_map(key)?, target))
            .collect()
    }

    /// `_on: { Type: filter }` on interfaces. Types without a branch are not filtered.
    fn extract_narrowing(&mut self, value: InputValue, interface: &Interface) -> CompileResult<Filter> {
        let mut branches = Vec::new();

        for (type_name, value) in value.into_map("_on")? {
            let entity = interface
                .implementations()
                .into_iter()
                .find(|e| e.name() == type_name)
                .ok_or_else(|| InputValidationError::UnknownFilter {
                    container: format!("{}._on", interface.name()),
                    key: type_name.clone(),
                })?;

            let filter = self.extract(value.into_map(&type_name)?, &FilterTarget::Entity(entity.clone()))?;
            branches.push((entity, filter));
        }

        if branches.is_empty() {
            return Ok(Filter::Empty);
        }

        Ok(Filter::TypeNarrowing(TypeNarrowingFilter {
            branches,
            exclude_unlisted: false,
        }))
    }

    /// `{ Member: filter }` on unions. Only listed members match.
    fn extract_union(&mut self, map: InputMap, union: &Union) -> CompileResult<Filter> {
        if map.is_empty() {
            return Ok(Filter::Empty);
        }

        let mut branches = Vec::with_capacity(map.len());

        for (type_name, value) in map {
            let entity = union.member(&type_name).ok_or_else(|| InputValidationError::UnknownFilter {
                container: union.name().to_owned(),
                key: type_name.clone(),
            })?;

            let filter = self.extract(value.into_map(&type_name)?, &FilterTarget::Entity(entity.clone()))?;
            branches.push((entity, filter));
        }

        Ok(Filter::TypeNarrowing(TypeNarrowingFilter {
            branches,
            exclude_unlisted: true,
        }))
    }

    /// Resolves a key to a field: the exact field name first, then operator suffixes, then the
    /// `Connection` and `Aggregate` forms of relationships.
    fn extract_field(&mut self, key: &str, value: InputValue, target: &FilterTarget) -> CompileResult<Filter> {
        let Some(container) = target.container() else {
            return Err(unknown_filter(target, key));
        };

        if let Some(field) = container.find_field(key) {
            return match field {
                Field::Scalar(sf) => self.scalar_filter(sf, ScalarOperator::Equals, key, value),
                Field::Relation(rf) => self.relation_filter(rf, key, None, value),
                Field::Computed(_) => Err(InputValidationError::InvalidOperator {
                    field: format!("{}.{key}", target.name()),
                    operator: String::from("filter"),
                }
                .into()),
            };
        }

        for (suffix, operator) in scalar::OPERATORS.iter().copied() {
            let Some(base) = key.strip_suffix(suffix) else {
                continue;
            };

            match container.find_field(base) {
                Some(Field::Scalar(sf)) => return self.scalar_filter(sf, operator, key, value),
                Some(Field::Relation(rf)) if operator == ScalarOperator::Not => {
                    return self.relation_filter(rf, key, Some(suffix), value);
                }
                Some(_) => {
                    return Err(InputValidationError::InvalidOperator {
                        field: format!("{}.{base}", target.name()),
                        operator: suffix.to_owned(),
                    }
                    .into());
                }
                None => (),
            }
        }

        for suffix in relation::QUANTIFIERS {
            if let Some(base) = key.strip_suffix(suffix) {
                if let Some(rf) = container.find_relation_field(base) {
                    return self.relation_filter(rf, key, Some(suffix), value);
                }

                if let Some(rf) = base.strip_suffix("Connection").and_then(|b| container.find_relation_field(b)) {
                    return self.connection_filter(rf, key, Some(suffix), value);
                }
            }
        }

        if let Some(rf) = key.strip_suffix("_NOT").and_then(|b| b.strip_suffix("Connection")) {
            if let Some(rf) = container.find_relation_field(rf) {
                return self.connection_filter(rf, key, Some("_NOT"), value);
            }
        }

        if let Some(rf) = key.strip_suffix("Connection").and_then(|b| container.find_relation_field(b)) {
            return self.connection_filter(rf, key, None, value);
        }

        if let Some(rf) = key.strip_suffix("Aggregate").and_then(|b| container.find_relation_field(b)) {
            return self.aggregation_filter(rf, key, value);
        }

        Err(unknown_filter(target, key))
    }
}

fn unknown_filter(target: &FilterTarget, key: &str) -> crate::CompileError {
    InputValidationError::UnknownFilter {
        container: target.name().to_owned(),
        key: key.to_owned(),
    }
    .into()
}

#[cfg(test)]
mod tests;
