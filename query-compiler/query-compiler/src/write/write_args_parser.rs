use crate::{
    CompileResult, InputValidationError,
    extractors::typed_value,
    input::{InputMap, InputValue},
    translate::field_value,
};
use cypher_builder::ast::*;
use graph_value::GraphValue;
use itertools::Itertools;
use query_structure::{Field, FieldContainer, RelationField, ScalarField, ScalarType, TimestampOperation};

/// How a property is written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WriteOperation {
    /// `n.p = $v`
    Set(GraphValue),
    /// `n.p = n.p <op> $v`
    Arithmetic(BinaryOperator, GraphValue),
    /// `n.p = n.p + $v` on lists.
    Push(GraphValue),
    /// `n.p = n.p[..0 - $v]` on lists.
    Pop(GraphValue),
    /// `n.p = randomUUID()`
    Generate,
    /// `n.p = datetime()`
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Create,
    Update,
}

/// Operators of updates, suffixed to the field name: `views_INCREMENT`.
const OPERATORS: [&str; 8] = ["INCREMENT", "DECREMENT", "ADD", "SUBTRACT", "MULTIPLY", "DIVIDE", "PUSH", "POP"];

#[derive(Default, Debug)]
pub(crate) struct WriteArgsParser {
    /// Writes of the input, in input order.
    pub(crate) args: Vec<(ScalarField, WriteOperation)>,
    /// Generated ids, timestamps and defaults of fields the input leaves out.
    pub(crate) implicit: Vec<(ScalarField, WriteOperation)>,
    /// Relationship inputs, in input order.
    pub(crate) nested: Vec<(RelationField, InputValue)>,
}

impl WriteArgsParser {
    /// Expects the map of properties, e.g. the `node` of a nested create, not the enclosing map.
    #[tracing::instrument(name = "write_args_parser_from", skip(container, data_map))]
    pub(crate) fn from(container: &dyn FieldContainer, data_map: InputMap, mode: WriteMode) -> CompileResult<Self> {
        let mut parser = data_map.into_iter().try_fold(
            WriteArgsParser::default(),
            |mut parser, (key, value)| -> CompileResult<WriteArgsParser> {
                match container.find_field(&key) {
                    Some(Field::Scalar(sf)) if sf.is_stored() => {
                        let value = scalar_value(&sf, value)?;
                        parser.args.push((sf, WriteOperation::Set(value)));
                    }
                    Some(Field::Scalar(sf)) => {
                        return Err(
                            InputValidationError::unsupported("write", &sf.to_string(), "the field is resolved by the caller")
                                .into(),
                        );
                    }
                    Some(Field::Computed(cf)) => {
                        return Err(InputValidationError::unsupported(
                            "write",
                            &format!("{}.{}", container.container_name(), cf.name()),
                            "computed fields are read-only",
                        )
                        .into());
                    }
                    Some(Field::Relation(rf)) => {
                        if !value.is_null() {
                            parser.nested.push((rf, value));
                        }
                    }
                    None => {
                        let (sf, operation) = parse_operator(container, &key, value, mode)?;
                        parser.args.push((sf, operation));
                    }
                }

                Ok(parser)
            },
        )?;

        if let Some(field) = parser.args.iter().map(|(sf, _)| sf.name()).duplicates().next() {
            return Err(InputValidationError::unsupported(
                "write",
                &format!("{}.{field}", container.container_name()),
                "a field can only be written once",
            )
            .into());
        }

        parser.implicit = implicit_writes(container, &parser.args, mode)?;

        Ok(parser)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.args.is_empty() && self.implicit.is_empty()
    }

    /// `SET` items of the input followed by the implicit ones. Parameters are named after the
    /// variable and the field: `$this0_title`.
    pub(crate) fn set_items(&self, variable: &Variable) -> Vec<SetItem> {
        self.args
            .iter()
            .chain(self.implicit.iter())
            .map(|(field, operation)| set_item(variable, field, operation))
            .collect()
    }

    /// Only the items of the input.
    pub(crate) fn input_items(&self, variable: &Variable) -> Vec<SetItem> {
        self.args
            .iter()
            .map(|(field, operation)| set_item(variable, field, operation))
            .collect()
    }

    /// Only the implicit items.
    pub(crate) fn implicit_items(&self, variable: &Variable) -> Vec<SetItem> {
        self.implicit
            .iter()
            .map(|(field, operation)| set_item(variable, field, operation))
            .collect()
    }
}

fn scalar_value(field: &ScalarField, value: InputValue) -> CompileResult<GraphValue> {
    let path = field.to_string();

    if value.is_null() {
        return if field.is_required() {
            Err(InputValidationError::invalid_value(path, "a value", "null").into())
        } else {
            Ok(GraphValue::Null)
        };
    }

    if field.is_list() {
        return list_value(field, value);
    }

    Ok(typed_value(&path, field.type_identifier(), value)?)
}

/// Every element must fit the field type. A single value is a list of one.
fn list_value(field: &ScalarField, value: InputValue) -> CompileResult<GraphValue> {
    let path = field.to_string();
    let tpe = field.type_identifier();

    let items = match value {
        InputValue::List(items) => items,
        single => vec![single],
    };

    let values = items
        .into_iter()
        .map(|item| typed_value(&path, tpe, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GraphValue::List(values))
}

fn parse_operator(
    container: &dyn FieldContainer,
    key: &str,
    value: InputValue,
    mode: WriteMode,
) -> CompileResult<(ScalarField, WriteOperation)> {
    let unknown = || InputValidationError::unknown_field(container.container_name(), key);

    let (name, operator) = OPERATORS
        .iter()
        .find_map(|operator| {
            key.strip_suffix(operator)
                .and_then(|rest| rest.strip_suffix('_'))
                .map(|name| (name, *operator))
        })
        .ok_or_else(unknown)?;

    let field = container
        .find_scalar_field(name)
        .filter(ScalarField::is_stored)
        .ok_or_else(unknown)?;

    let invalid = || InputValidationError::InvalidOperator {
        field: field.to_string(),
        operator: operator.to_owned(),
    };

    if mode == WriteMode::Create || value.is_null() {
        return Err(invalid().into());
    }

    let tpe = field.type_identifier();
    let path = format!("{field}_{operator}");
    let integer = matches!(tpe, ScalarType::Int | ScalarType::BigInt) && !field.is_list();
    let float = tpe == ScalarType::Float && !field.is_list();

    let operation = match operator {
        "INCREMENT" if integer => WriteOperation::Arithmetic(BinaryOperator::Add, typed_value(&path, tpe, value)?),
        "DECREMENT" if integer => WriteOperation::Arithmetic(BinaryOperator::Subtract, typed_value(&path, tpe, value)?),
        "ADD" if float => WriteOperation::Arithmetic(BinaryOperator::Add, typed_value(&path, tpe, value)?),
        "SUBTRACT" if float => WriteOperation::Arithmetic(BinaryOperator::Subtract, typed_value(&path, tpe, value)?),
        "MULTIPLY" if float => WriteOperation::Arithmetic(BinaryOperator::Multiply, typed_value(&path, tpe, value)?),
        "DIVIDE" if float => WriteOperation::Arithmetic(BinaryOperator::Divide, typed_value(&path, tpe, value)?),
        "PUSH" if field.is_list() => WriteOperation::Push(list_value(&field, value)?),
        "POP" if field.is_list() => WriteOperation::Pop(typed_value(&path, ScalarType::Int, value)?),
        _ => return Err(invalid().into()),
    };

    Ok((field, operation))
}

/// Values the database fills in when the input leaves a field out.
///
/// | Field               | Create         | Update     |
/// |---                  |---             |---         |
/// | generated id        | `randomUUID()` |            |
/// | `CREATE` timestamp  | `datetime()`   |            |
/// | `UPDATE` timestamp  |                | `datetime()` |
/// | default value       | `$default`     |            |
/// | required, none of these | error      |            |
fn implicit_writes(
    container: &dyn FieldContainer,
    args: &[(ScalarField, WriteOperation)],
    mode: WriteMode,
) -> CompileResult<Vec<(ScalarField, WriteOperation)>> {
    let mut implicit = Vec::new();

    for field in container.scalar_fields() {
        if !field.is_stored() || args.iter().any(|(written, _)| written.name() == field.name()) {
            continue;
        }

        let operation = match mode {
            WriteMode::Create if field.is_generated() => WriteOperation::Generate,
            WriteMode::Create if field.has_timestamp(TimestampOperation::Create) => WriteOperation::Now,
            WriteMode::Create => match field.default_value() {
                Some(default) => WriteOperation::Set(default.clone()),
                None if field.is_required() => {
                    return Err(InputValidationError::MissingRequiredField {
                        container: container.container_name().to_owned(),
                        field: field.name().to_owned(),
                    }
                    .into());
                }
                None => continue,
            },
            WriteMode::Update if field.has_timestamp(TimestampOperation::Update) => WriteOperation::Now,
            WriteMode::Update => continue,
        };

        implicit.push((field, operation));
    }

    Ok(implicit)
}

fn set_item(variable: &Variable, field: &ScalarField, operation: &WriteOperation) -> SetItem {
    let hint = format!("{variable}_{}", field.name());
    let property = variable.property(field.db_name());

    let value = match operation {
        WriteOperation::Set(value) => field_value(field, &hint, value.clone()),
        WriteOperation::Arithmetic(operator, value) => property.binary(*operator, Expression::param(hint, value.clone())),
        WriteOperation::Push(value) => property.binary(BinaryOperator::Add, field_value(field, &hint, value.clone())),
        WriteOperation::Pop(value) => property.slice(
            None,
            Some(Expression::int(0).binary(BinaryOperator::Subtract, Expression::param(hint, value.clone()))),
        ),
        WriteOperation::Generate => Expression::function("randomUUID", Vec::new()),
        WriteOperation::Now if field.type_identifier() == ScalarType::Date => Expression::function("date", Vec::new()),
        WriteOperation::Now => Expression::function("datetime", Vec::new()),
    };

    SetItem::property(variable, field.db_name(), value)
}
