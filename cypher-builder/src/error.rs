//! Error module
use thiserror::Error;

/// A statement that would be rejected by the database, or that reads variables it never bound.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Variable `{name}` is not defined in this scope.")]
    UndefinedVariable { name: String },

    #[error("Variable `{name}` is already declared.")]
    VariableAlreadyDeclared { name: String },

    #[error("Subquery returns `{name}`, which already exists in the outer scope.")]
    ReturnShadowsOuter { name: String },

    #[error("All branches of a UNION must return the same columns, expected {expected:?}, found {found:?}.")]
    UnionColumnMismatch { expected: Vec<String>, found: Vec<String> },

    #[error("Expression `{expression}` must be aliased.")]
    MissingAlias { expression: String },

    #[error("Parameter `${name}` is shared but no value was provided for it.")]
    UnboundSharedParameter { name: String },
}
