use crate::{ContainerId, Entity, EntityId, ScalarType, Zipper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputedFieldId {
    pub container: ContainerId,
    pub(crate) index: usize,
}

/// A field backed by a Cypher statement.
pub type ComputedField = Zipper<ComputedFieldId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComputedReturnRef {
    Scalar(ScalarType),
    Entity(EntityId),
}

#[derive(Debug)]
pub(crate) struct ComputedFieldData {
    pub(crate) name: String,
    pub(crate) statement: String,
    pub(crate) column_name: String,
    pub(crate) list: bool,
    pub(crate) returns: ComputedReturnRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComputedReturn {
    Scalar(ScalarType),
    Entity(Entity),
}

impl ComputedField {
    fn data(&self) -> &ComputedFieldData {
        &self.schema.data.fields(self.id.container).computed[self.id.index]
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn statement(&self) -> &str {
        &self.data().statement
    }

    pub fn column_name(&self) -> &str {
        &self.data().column_name
    }

    pub fn is_list(&self) -> bool {
        self.data().list
    }

    pub fn returns(&self) -> ComputedReturn {
        match self.data().returns {
            ComputedReturnRef::Scalar(tpe) => ComputedReturn::Scalar(tpe),
            ComputedReturnRef::Entity(id) => ComputedReturn::Entity(self.schema.zip(id)),
        }
    }

    pub fn container_name(&self) -> &str {
        self.schema.data.container_name(self.id.container)
    }
}
