use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    /// The operation does not fit the schema. No program is produced.
    #[error(transparent)]
    Input(#[from] InputValidationError),

    /// The compiler built a statement that reads or shadows variables it should not.
    /// Not a user error.
    #[error("Invalid statement generated: {0}")]
    InvariantViolation(#[from] cypher_builder::Error),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InputValidationError {
    #[error("Unknown type `{name}`.")]
    UnknownType { name: String },

    #[error("`{container}` has no field `{field}`.")]
    UnknownField { container: String, field: String },

    #[error("`{container}.{field}` is not a relationship.")]
    NotARelationship { container: String, field: String },

    #[error("Unknown filter `{key}` on `{container}`.")]
    UnknownFilter { container: String, key: String },

    #[error("Operator `{operator}` cannot be used on `{field}`.")]
    InvalidOperator { field: String, operator: String },

    #[error("Invalid value for `{path}`: expected {expected}, found {found}.")]
    InvalidValue {
        path: String,
        expected: String,
        found: String,
    },

    #[error("`{field}` is a singular relationship and expects a single object.")]
    ExpectedSingle { field: String },

    #[error("Missing required field `{field}` on `{container}`.")]
    MissingRequiredField { container: String, field: String },

    #[error("Invalid sort direction `{direction}` for `{field}`, expected `ASC` or `DESC`.")]
    InvalidSortDirection { field: String, direction: String },

    #[error("Cannot sort on `{field}`.")]
    InvalidSortField { field: String },

    #[error("Invalid cursor `{cursor}`.")]
    InvalidCursor { cursor: String },

    #[error("Nested operation `{operation}` is not allowed on `{field}`.")]
    DisallowedNestedOperation { field: String, operation: String },

    #[error("`{operation}` is not supported on `{target}`: {reason}.")]
    Unsupported {
        operation: String,
        target: String,
        reason: String,
    },
}

impl InputValidationError {
    pub(crate) fn invalid_value(path: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        InputValidationError::InvalidValue {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn unknown_field(container: &str, field: &str) -> Self {
        InputValidationError::UnknownField {
            container: container.to_owned(),
            field: field.to_owned(),
        }
    }

    pub(crate) fn unsupported(operation: &str, target: &str, reason: impl Into<String>) -> Self {
        InputValidationError::Unsupported {
            operation: operation.to_owned(),
            target: target.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Checks embedded in a program that abort the transaction when they fail.
///
/// The database reports them as errors whose message starts with [`RuntimeViolation::identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeViolation {
    /// An authorization validate rule did not hold.
    Forbidden,
    /// A relationship ended up with a number of edges its cardinality does not allow.
    RelationshipCardinality,
}

impl RuntimeViolation {
    pub fn identifier(self) -> &'static str {
        match self {
            RuntimeViolation::Forbidden => "FORBIDDEN",
            RuntimeViolation::RelationshipCardinality => "RELATIONSHIP_CARDINALITY",
        }
    }
}

/// Failures of a program at execution time, recovered from the database error message.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RuntimeError {
    #[error("Forbidden")]
    AuthorizationForbidden,

    #[error("{message}")]
    RelationshipCardinality { message: String },
}

impl RuntimeError {
    /// Maps the message of a failed execution to the violation that caused it, if any.
    pub fn from_database_message(message: &str) -> Option<RuntimeError> {
        let forbidden = RuntimeViolation::Forbidden.identifier();
        let cardinality = RuntimeViolation::RelationshipCardinality.identifier();

        if message.contains(forbidden) {
            return Some(RuntimeError::AuthorizationForbidden);
        }

        let start = message.find(cardinality)?;

        Some(RuntimeError::RelationshipCardinality {
            message: message[start..].trim().to_owned(),
        })
    }
}
