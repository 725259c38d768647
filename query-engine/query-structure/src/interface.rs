use crate::{ContainerId, Entity, FieldContainer, InterfaceId, Schema, UnionId, Zipper};

pub type Interface = Zipper<InterfaceId>;

impl Interface {
    pub fn name(&self) -> &str {
        &self.schema.data.interfaces[self.id.0].name
    }

    pub fn implementations(&self) -> Vec<Entity> {
        self.schema.data.interfaces[self.id.0]
            .implementations
            .iter()
            .map(|id| self.schema.zip(*id))
            .collect()
    }
}

impl FieldContainer for Interface {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn container_id(&self) -> ContainerId {
        ContainerId::Interface(self.id)
    }
}

pub type Union = Zipper<UnionId>;

impl Union {
    pub fn name(&self) -> &str {
        &self.schema.data.unions[self.id.0].name
    }

    pub fn members(&self) -> Vec<Entity> {
        self.schema.data.unions[self.id.0]
            .members
            .iter()
            .map(|id| self.schema.zip(*id))
            .collect()
    }

    pub fn member(&self, name: &str) -> Option<Entity> {
        self.members().into_iter().find(|e| e.name() == name)
    }
}
