use query_structure::{AuthorizationOperation, AuthorizationRule, Entity};

/// The source of authorization rules. Injected into the compiler, so that rules can come from
/// somewhere else than the schema, e.g. a policy service loaded at startup.
pub trait AuthorizationProvider: Send + Sync {
    /// Rules guarding `operation` on nodes of `entity`, in evaluation order.
    fn rules(&self, entity: &Entity, operation: AuthorizationOperation) -> Vec<AuthorizationRule>;
}

/// Reads the rules declared on the node types of the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAuthorization;

impl AuthorizationProvider for SchemaAuthorization {
    fn rules(&self, entity: &Entity, operation: AuthorizationOperation) -> Vec<AuthorizationRule> {
        entity.schema.authorization_rules_of(entity, operation)
    }
}
