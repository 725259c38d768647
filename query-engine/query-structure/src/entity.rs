use crate::{
    AuthorizationOperation, AuthorizationRule, ContainerId, EntityId, FieldContainer, Interface, QueryLimit, Schema,
    Zipper,
};

/// A node type.
pub type Entity = Zipper<EntityId>;

impl Entity {
    fn data(&self) -> &crate::schema::EntityData {
        &self.schema.data.entities[self.id.0]
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// Database labels, the first one is the primary label.
    pub fn labels(&self) -> &[String] {
        &self.data().labels
    }

    pub fn interfaces(&self) -> Vec<Interface> {
        self.data().implements.iter().map(|id| self.schema.zip(*id)).collect()
    }

    pub fn implements(&self, interface: &Interface) -> bool {
        self.data().implements.contains(&interface.id)
    }

    pub fn limit(&self) -> Option<QueryLimit> {
        self.data().limit
    }

    /// Rules that apply to the given operation, in declaration order.
    pub fn authorization_rules(&self, operation: AuthorizationOperation) -> impl Iterator<Item = &AuthorizationRule> {
        self.data()
            .authorization
            .iter()
            .filter(move |rule| rule.applies_to(operation))
    }

    pub fn has_authorization(&self) -> bool {
        !self.data().authorization.is_empty()
    }
}

impl FieldContainer for Entity {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn container_id(&self) -> ContainerId {
        ContainerId::Entity(self.id)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
