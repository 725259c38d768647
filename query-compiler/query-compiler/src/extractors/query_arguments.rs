use crate::{
    CompileResult, InputValidationError,
    input::{InputMap, InputValue, coerce_vec},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use graph_value::GraphValue;
use query_structure::*;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Sorting and pagination of a list read.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QueryArguments {
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

impl QueryArguments {
    pub(crate) fn is_empty(&self) -> bool {
        self.order_by.is_empty() && self.limit.is_none() && self.offset.is_none()
    }
}

/// Either side of a connection sort.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConnectionSort {
    Node(OrderBy),
    Edge(OrderBy),
}

/// Sorting and pagination of a connection: `sort`, `first` and `after`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ConnectionArguments {
    pub(crate) sort: Vec<ConnectionSort>,
    pub(crate) first: Option<i64>,
    pub(crate) offset: Option<i64>,
}

/// Extracts `options { sort, limit, offset }`. The entity limits apply when `limit` is
/// missing or too large.
///
/// `container` is `None` for unions, which cannot be sorted.
pub(crate) fn extract_query_args(
    options: Option<InputMap>,
    container: Option<&dyn FieldContainer>,
    query_limit: Option<QueryLimit>,
) -> CompileResult<QueryArguments> {
    let mut args = QueryArguments::default();
    let mut requested_limit = None;

    for (key, value) in options.unwrap_or_default() {
        match key.as_str() {
            "sort" => {
                let Some(container) = container else {
                    return Err(InputValidationError::unsupported("sort", "union", "union members share no fields").into());
                };

                args.order_by = extract_sort(value, container)?;
            }
            "limit" => requested_limit = non_negative("options.limit", value)?,
            "offset" => args.offset = non_negative("options.offset", value)?,
            _ => return Err(InputValidationError::unknown_field("options", &key).into()),
        }
    }

    args.limit = apply_query_limit(requested_limit, query_limit);

    Ok(args)
}

fn apply_query_limit(requested: Option<i64>, query_limit: Option<QueryLimit>) -> Option<i64> {
    match (requested, query_limit) {
        (Some(limit), Some(QueryLimit { max: Some(max), .. })) => Some(limit.min(max)),
        (Some(limit), _) => Some(limit),
        (None, Some(query_limit)) => query_limit.default.or(query_limit.max),
        (None, None) => None,
    }
}

/// `sort: [{ title: ASC }, { released: DESC }]`. Keys of one object sort in key order.
fn extract_sort(value: InputValue, container: &dyn FieldContainer) -> CompileResult<Vec<OrderBy>> {
    let mut order_by = Vec::new();

    for entry in coerce_vec(value) {
        for (field_name, direction) in entry.into_map("sort")? {
            order_by.push(extract_order_by(container, &field_name, direction)?);
        }
    }

    Ok(order_by)
}

fn extract_order_by(container: &dyn FieldContainer, field_name: &str, direction: InputValue) -> CompileResult<OrderBy> {
    let path = format!("{}.{field_name}", container.container_name());

    let sort_order = direction
        .as_str()
        .and_then(SortOrder::parse)
        .ok_or_else(|| InputValidationError::InvalidSortDirection {
            field: path.clone(),
            direction: match &direction {
                InputValue::Scalar(GraphValue::String(s)) => s.clone(),
                other => other.type_name().to_owned(),
            },
        })?;

    let field = container
        .find_field(field_name)
        .ok_or_else(|| InputValidationError::unknown_field(container.container_name(), field_name))?;

    match field {
        Field::Scalar(sf) if sf.is_stored() && !sf.is_list() && sf.type_identifier().is_orderable() => {
            Ok(OrderBy::scalar(sf, sort_order))
        }
        Field::Computed(cf) if !cf.is_list() && matches!(cf.returns(), ComputedReturn::Scalar(tpe) if tpe.is_orderable()) => {
            Ok(OrderBy::computed(cf, sort_order))
        }
        _ => Err(InputValidationError::InvalidSortField { field: path }.into()),
    }
}

/// Extracts the arguments of a connection field: `sort: [{ node: { .. }, edge: { .. } }]`,
/// `first` and `after`.
pub(crate) fn extract_connection_args(arguments: &InputMap, field: &RelationField) -> CompileResult<ConnectionArguments> {
    let mut args = ConnectionArguments::default();

    for (key, value) in arguments {
        match key.as_str() {
            "where" => (),
            "first" => args.first = non_negative("first", value.clone())?,
            "after" => args.offset = Some(cursor_to_offset(value)? + 1),
            "sort" => {
                for entry in coerce_vec(value.clone()) {
                    for (side, fields) in entry.into_map("sort")? {
                        match side.as_str() {
                            "node" => {
                                let CompositeType::Entity(target) = field.target() else {
                                    return Err(InputValidationError::unsupported(
                                        "sort",
                                        &field.to_string(),
                                        "connections to abstract types sort on edges only",
                                    )
                                    .into());
                                };

                                for order_by in extract_sort(fields, &target)? {
                                    args.sort.push(ConnectionSort::Node(order_by));
                                }
                            }
                            "edge" => {
                                let properties = field
                                    .properties()
                                    .ok_or_else(|| InputValidationError::InvalidSortField { field: format!("{field}.edge") })?;

                                for order_by in extract_sort(fields, &properties)? {
                                    args.sort.push(ConnectionSort::Edge(order_by));
                                }
                            }
                            _ => return Err(InputValidationError::unknown_field("sort", &side).into()),
                        }
                    }
                }
            }
            _ => return Err(InputValidationError::unknown_field(&format!("{field}Connection"), key).into()),
        }
    }

    Ok(args)
}

fn non_negative(path: &str, value: InputValue) -> Result<Option<i64>, InputValidationError> {
    match value {
        InputValue::Scalar(GraphValue::Null) => Ok(None),
        InputValue::Scalar(GraphValue::Int(i)) if i >= 0 => Ok(Some(i)),
        InputValue::Scalar(GraphValue::Int(i)) => {
            Err(InputValidationError::invalid_value(path, "a non-negative Int", i.to_string()))
        }
        other => Err(InputValidationError::invalid_value(path, "Int", other.type_name())),
    }
}

/// The cursor of the edge at `offset` in a connection.
pub fn offset_to_cursor(offset: i64) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

pub(crate) fn cursor_to_offset(value: &InputValue) -> Result<i64, InputValidationError> {
    let cursor = value.as_str().ok_or_else(|| InputValidationError::InvalidCursor {
        cursor: value.type_name().to_owned(),
    })?;

    let invalid = || InputValidationError::InvalidCursor {
        cursor: cursor.to_owned(),
    };

    let decoded = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;

    decoded
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse::<i64>().ok())
        .filter(|offset| *offset >= 0)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cursors_encode_array_offsets() {
        let cursor = offset_to_cursor(4);

        assert_eq!("YXJyYXljb25uZWN0aW9uOjQ=", cursor);
        assert_eq!(Ok(4), cursor_to_offset(&InputValue::Scalar(GraphValue::from(cursor))));
    }

    #[test]
    fn garbage_cursors_are_rejected() {
        let value = InputValue::Scalar(GraphValue::from("not a cursor"));

        assert_eq!(
            Err(InputValidationError::InvalidCursor {
                cursor: "not a cursor".into()
            }),
            cursor_to_offset(&value)
        );
    }

    #[test]
    fn entity_limits_bound_the_requested_limit() {
        let limit = QueryLimit {
            default: Some(10),
            max: Some(100),
        };

        assert_eq!(Some(10), apply_query_limit(None, Some(limit)));
        assert_eq!(Some(100), apply_query_limit(Some(500), Some(limit)));
        assert_eq!(Some(5), apply_query_limit(Some(5), Some(limit)));
        assert_eq!(
            Some(100),
            apply_query_limit(None, Some(QueryLimit { default: None, max: Some(100) }))
        );
        assert_eq!(None, apply_query_limit(None, None));
    }
}
