use crate::definition::{AuthorizationRuleDefinition, AuthorizationWhere, RuleKind, ValidationWhen};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationOperation {
    Read,
    Aggregate,
    Create,
    Update,
    Delete,
    Connect,
    Disconnect,
}

impl AuthorizationOperation {
    pub const ALL: [AuthorizationOperation; 7] = [
        AuthorizationOperation::Read,
        AuthorizationOperation::Aggregate,
        AuthorizationOperation::Create,
        AuthorizationOperation::Update,
        AuthorizationOperation::Delete,
        AuthorizationOperation::Connect,
        AuthorizationOperation::Disconnect,
    ];
}

impl fmt::Display for AuthorizationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthorizationOperation::Read => "read",
            AuthorizationOperation::Aggregate => "aggregate",
            AuthorizationOperation::Create => "create",
            AuthorizationOperation::Update => "update",
            AuthorizationOperation::Delete => "delete",
            AuthorizationOperation::Connect => "connect",
            AuthorizationOperation::Disconnect => "disconnect",
        };

        f.write_str(s)
    }
}

/// A normalized authorization rule attached to a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRule {
    pub kind: RuleKind,
    pub operations: Vec<AuthorizationOperation>,
    pub when: Vec<ValidationWhen>,
    pub requires_authentication: bool,
    pub filter: AuthorizationWhere,
}

impl AuthorizationRule {
    pub fn applies_to(&self, operation: AuthorizationOperation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn is_filter(&self) -> bool {
        self.kind == RuleKind::Filter
    }

    pub fn validates(&self, when: ValidationWhen) -> bool {
        self.kind == RuleKind::Validate && self.when.contains(&when)
    }
}

impl From<AuthorizationRuleDefinition> for AuthorizationRule {
    fn from(definition: AuthorizationRuleDefinition) -> Self {
        let operations = definition
            .operations
            .unwrap_or_else(|| AuthorizationOperation::ALL.to_vec());

        let when = match definition.kind {
            RuleKind::Filter => Vec::new(),
            RuleKind::Validate => definition
                .when
                .unwrap_or_else(|| vec![ValidationWhen::Before, ValidationWhen::After]),
        };

        AuthorizationRule {
            kind: definition.kind,
            operations,
            when,
            requires_authentication: definition.requires_authentication,
            filter: definition.where_.unwrap_or_default(),
        }
    }
}
