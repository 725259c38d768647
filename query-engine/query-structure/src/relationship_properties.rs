use crate::{ContainerId, FieldContainer, PropertiesId, Schema, Zipper};

/// Fields stored on the edge of a relationship.
pub type RelationshipProperties = Zipper<PropertiesId>;

impl RelationshipProperties {
    pub fn name(&self) -> &str {
        &self.schema.data.properties[self.id.0].name
    }
}

impl FieldContainer for RelationshipProperties {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn container_id(&self) -> ContainerId {
        ContainerId::Properties(self.id)
    }
}
