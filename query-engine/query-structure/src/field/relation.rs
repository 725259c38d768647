use crate::{
    CompositeType, ContainerId, EntityId, InterfaceId, RelationshipProperties, PropertiesId, UnionId, Zipper,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationFieldId {
    pub container: ContainerId,
    pub(crate) index: usize,
}

pub type RelationField = Zipper<RelationFieldId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationDirection {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

/// What happens when the same pair of nodes is connected twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicationPolicy {
    /// Reuse the existing edge.
    #[default]
    Merge,
    /// Always create a new edge.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NestedOperation {
    Create,
    Connect,
    Disconnect,
    Update,
    Delete,
    ConnectOrCreate,
}

impl NestedOperation {
    pub fn from_input_key(key: &str) -> Option<NestedOperation> {
        let op = match key {
            "create" => NestedOperation::Create,
            "connect" => NestedOperation::Connect,
            "disconnect" => NestedOperation::Disconnect,
            "update" => NestedOperation::Update,
            "delete" => NestedOperation::Delete,
            "connectOrCreate" => NestedOperation::ConnectOrCreate,
            _ => return None,
        };

        Some(op)
    }

    pub fn input_key(self) -> &'static str {
        match self {
            NestedOperation::Create => "create",
            NestedOperation::Connect => "connect",
            NestedOperation::Disconnect => "disconnect",
            NestedOperation::Update => "update",
            NestedOperation::Delete => "delete",
            NestedOperation::ConnectOrCreate => "connectOrCreate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ExactlyOne,
    AtMostOne,
    AtLeastOne,
    Many,
}

impl Cardinality {
    /// Whether writes to the relationship need a validation pass.
    pub fn is_constrained(self) -> bool {
        !matches!(self, Cardinality::Many)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Cardinality::ExactlyOne => "required exactly once",
            Cardinality::AtMostOne => "must not have more than one relationship",
            Cardinality::AtLeastOne => "required at least once",
            Cardinality::Many => "unconstrained",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetRef {
    Entity(EntityId),
    Interface(InterfaceId),
    Union(UnionId),
}

#[derive(Debug)]
pub(crate) struct RelationFieldData {
    pub(crate) name: String,
    pub(crate) rel_type: String,
    pub(crate) direction: RelationDirection,
    pub(crate) undirected_queries: bool,
    pub(crate) target: TargetRef,
    pub(crate) properties: Option<PropertiesId>,
    pub(crate) list: bool,
    pub(crate) required: bool,
    pub(crate) non_empty: bool,
    pub(crate) duplicates: DuplicationPolicy,
    pub(crate) nested_operations: Option<Vec<NestedOperation>>,
}

impl RelationField {
    fn data(&self) -> &RelationFieldData {
        &self.schema.data.fields(self.id.container).relations[self.id.index]
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn rel_type(&self) -> &str {
        &self.data().rel_type
    }

    pub fn direction(&self) -> RelationDirection {
        self.data().direction
    }

    /// Reads ignore the declared direction.
    pub fn undirected_queries(&self) -> bool {
        self.data().undirected_queries
    }

    pub fn container_name(&self) -> &str {
        self.schema.data.container_name(self.id.container)
    }

    pub fn target(&self) -> CompositeType {
        match self.data().target {
            TargetRef::Entity(id) => CompositeType::Entity(self.schema.zip(id)),
            TargetRef::Interface(id) => CompositeType::Interface(self.schema.zip(id)),
            TargetRef::Union(id) => CompositeType::Union(self.schema.zip(id)),
        }
    }

    pub fn properties(&self) -> Option<RelationshipProperties> {
        self.data().properties.map(|id| self.schema.zip(id))
    }

    pub fn is_list(&self) -> bool {
        self.data().list
    }

    pub fn is_required(&self) -> bool {
        self.data().required
    }

    pub fn cardinality(&self) -> Cardinality {
        let data = self.data();

        match (data.list, data.required, data.non_empty) {
            (true, _, true) => Cardinality::AtLeastOne,
            (true, _, false) => Cardinality::Many,
            (false, true, _) => Cardinality::ExactlyOne,
            (false, false, _) => Cardinality::AtMostOne,
        }
    }

    pub fn duplication_policy(&self) -> DuplicationPolicy {
        self.data().duplicates
    }

    pub fn allows(&self, operation: NestedOperation) -> bool {
        match &self.data().nested_operations {
            Some(allowed) => allowed.contains(&operation),
            None => true,
        }
    }
}

impl std::fmt::Display for RelationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.container_name(), self.name())
    }
}
