use crate::{
    field::{ComputedFieldData, RelationFieldData, ScalarFieldData},
    ComputedField, ComputedFieldId, ContainerId, Field, RelationField, RelationFieldId, ScalarField, ScalarFieldId,
    Schema,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldSlot {
    Scalar(usize),
    Relation(usize),
    Computed(usize),
}

/// Fields of one container, split by kind. `order` keeps the declaration order.
#[derive(Debug, Default)]
pub(crate) struct FieldSet {
    pub(crate) scalars: Vec<ScalarFieldData>,
    pub(crate) relations: Vec<RelationFieldData>,
    pub(crate) computed: Vec<ComputedFieldData>,
    pub(crate) order: Vec<FieldSlot>,
}

impl FieldSet {
    pub(crate) fn slot_name(&self, slot: FieldSlot) -> &str {
        match slot {
            FieldSlot::Scalar(i) => &self.scalars[i].name,
            FieldSlot::Relation(i) => &self.relations[i].name,
            FieldSlot::Computed(i) => &self.computed[i].name,
        }
    }

    pub(crate) fn find(&self, name: &str) -> Option<FieldSlot> {
        self.order.iter().copied().find(|slot| self.slot_name(*slot) == name)
    }
}

/// Shared field lookups of nodes, interfaces and relationship properties.
pub trait FieldContainer {
    fn schema(&self) -> &Schema;

    fn container_id(&self) -> ContainerId;

    fn container_name(&self) -> &str {
        self.schema().data.container_name(self.container_id())
    }

    fn fields(&self) -> Vec<Field> {
        let schema = self.schema();
        let container = self.container_id();

        schema
            .data
            .fields(container)
            .order
            .iter()
            .map(|slot| slot_to_field(schema, container, *slot))
            .collect()
    }

    fn find_field(&self, name: &str) -> Option<Field> {
        let schema = self.schema();
        let container = self.container_id();
        let slot = schema.data.fields(container).find(name)?;

        Some(slot_to_field(schema, container, slot))
    }

    fn find_scalar_field(&self, name: &str) -> Option<ScalarField> {
        match self.find_field(name)? {
            Field::Scalar(sf) => Some(sf),
            _ => None,
        }
    }

    fn find_relation_field(&self, name: &str) -> Option<RelationField> {
        match self.find_field(name)? {
            Field::Relation(rf) => Some(rf),
            _ => None,
        }
    }

    fn find_computed_field(&self, name: &str) -> Option<ComputedField> {
        match self.find_field(name)? {
            Field::Computed(cf) => Some(cf),
            _ => None,
        }
    }

    fn scalar_fields(&self) -> Vec<ScalarField> {
        let container = self.container_id();
        let count = self.schema().data.fields(container).scalars.len();

        (0..count)
            .map(|index| self.schema().zip(ScalarFieldId { container, index }))
            .collect()
    }

    fn relation_fields(&self) -> Vec<RelationField> {
        let container = self.container_id();
        let count = self.schema().data.fields(container).relations.len();

        (0..count)
            .map(|index| self.schema().zip(RelationFieldId { container, index }))
            .collect()
    }

    fn computed_fields(&self) -> Vec<ComputedField> {
        let container = self.container_id();
        let count = self.schema().data.fields(container).computed.len();

        (0..count)
            .map(|index| self.schema().zip(ComputedFieldId { container, index }))
            .collect()
    }

    /// Fields that identify a single node: the id field and unique fields.
    fn unique_fields(&self) -> Vec<ScalarField> {
        self.scalar_fields().into_iter().filter(|sf| sf.is_unique()).collect()
    }
}

fn slot_to_field(schema: &Schema, container: ContainerId, slot: FieldSlot) -> Field {
    match slot {
        FieldSlot::Scalar(index) => Field::Scalar(schema.zip(ScalarFieldId { container, index })),
        FieldSlot::Relation(index) => Field::Relation(schema.zip(RelationFieldId { container, index })),
        FieldSlot::Computed(index) => Field::Computed(schema.zip(ComputedFieldId { container, index })),
    }
}
