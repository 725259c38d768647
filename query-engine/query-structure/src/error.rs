use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SchemaValidationError {
    #[error("Type `{name}` is defined more than once.")]
    DuplicateType { name: String },

    #[error("Field `{field}` is defined more than once on `{container}`.")]
    DuplicateField { container: String, field: String },

    #[error("Field `{container}.{field}` references unknown type `{target}`.")]
    UnknownType {
        container: String,
        field: String,
        target: String,
    },

    #[error("Field `{container}.{field}` references unknown relationship properties `{properties}`.")]
    UnknownRelationshipProperties {
        container: String,
        field: String,
        properties: String,
    },

    #[error("Annotation `{annotation}` cannot be used on `{container}.{field}`: {reason}.")]
    IncompatibleAnnotation {
        container: String,
        field: String,
        annotation: &'static str,
        reason: String,
    },

    #[error("`{entity}` implements unknown interface `{interface}`.")]
    UnknownInterface { entity: String, interface: String },

    #[error("`{entity}` must declare field `{field}` of interface `{interface}`.")]
    MissingInterfaceField {
        entity: String,
        interface: String,
        field: String,
    },

    #[error("Union `{union}` member `{member}` is not a node type.")]
    InvalidUnionMember { union: String, member: String },

    #[error("Invalid value for `{container}.{field}`: {reason}.")]
    InvalidValue {
        container: String,
        field: String,
        reason: String,
    },
}

impl SchemaValidationError {
    pub(crate) fn incompatible(
        container: &str,
        field: &str,
        annotation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        SchemaValidationError::IncompatibleAnnotation {
            container: container.to_owned(),
            field: field.to_owned(),
            annotation,
            reason: reason.into(),
        }
    }
}
