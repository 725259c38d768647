use crate::{
    AuthorizationOperation, AuthorizationRule, Entity, FieldContainer, FieldSet, Interface, QueryLimit, RelationField,
    RelationshipProperties, Union, Zipper,
};
use std::{collections::HashMap, fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnionId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertiesId(pub(crate) usize);

/// Anything that owns fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Entity(EntityId),
    Interface(InterfaceId),
    Properties(PropertiesId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TypeRef {
    Entity(EntityId),
    Interface(InterfaceId),
    Union(UnionId),
    Properties(PropertiesId),
}

#[derive(Debug)]
pub(crate) struct EntityData {
    pub(crate) name: String,
    pub(crate) labels: Vec<String>,
    pub(crate) implements: Vec<InterfaceId>,
    pub(crate) fields: FieldSet,
    pub(crate) authorization: Vec<AuthorizationRule>,
    pub(crate) limit: Option<QueryLimit>,
}

#[derive(Debug)]
pub(crate) struct InterfaceData {
    pub(crate) name: String,
    pub(crate) fields: FieldSet,
    pub(crate) implementations: Vec<EntityId>,
}

#[derive(Debug)]
pub(crate) struct UnionData {
    pub(crate) name: String,
    pub(crate) members: Vec<EntityId>,
}

#[derive(Debug)]
pub(crate) struct PropertiesData {
    pub(crate) name: String,
    pub(crate) fields: FieldSet,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaData {
    pub(crate) entities: Vec<EntityData>,
    pub(crate) interfaces: Vec<InterfaceData>,
    pub(crate) unions: Vec<UnionData>,
    pub(crate) properties: Vec<PropertiesData>,
    pub(crate) types: HashMap<String, TypeRef>,
}

impl SchemaData {
    pub(crate) fn fields(&self, container: ContainerId) -> &FieldSet {
        match container {
            ContainerId::Entity(id) => &self.entities[id.0].fields,
            ContainerId::Interface(id) => &self.interfaces[id.0].fields,
            ContainerId::Properties(id) => &self.properties[id.0].fields,
        }
    }

    pub(crate) fn container_name(&self, container: ContainerId) -> &str {
        match container {
            ContainerId::Entity(id) => &self.entities[id.0].name,
            ContainerId::Interface(id) => &self.interfaces[id.0].name,
            ContainerId::Properties(id) => &self.properties[id.0].name,
        }
    }
}

/// The immutable, validated schema. Cloning is cheap and clones share the same data.
#[derive(Clone)]
pub struct Schema {
    pub(crate) data: Arc<SchemaData>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("entities", &self.data.entities.len())
            .field("interfaces", &self.data.interfaces.len())
            .field("unions", &self.data.unions.len())
            .finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// A named type that can be the target of a read or a relationship.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeType {
    Entity(Entity),
    Interface(Interface),
    Union(Union),
}

impl CompositeType {
    pub fn name(&self) -> &str {
        match self {
            CompositeType::Entity(e) => e.name(),
            CompositeType::Interface(i) => i.name(),
            CompositeType::Union(u) => u.name(),
        }
    }

    /// Node types that can be found behind this type, in declaration order.
    pub fn concrete_entities(&self) -> Vec<Entity> {
        match self {
            CompositeType::Entity(e) => vec![e.clone()],
            CompositeType::Interface(i) => i.implementations(),
            CompositeType::Union(u) => u.members(),
        }
    }

    pub fn is_abstract(&self) -> bool {
        !matches!(self, CompositeType::Entity(_))
    }
}

impl Schema {
    pub fn zip<I>(&self, id: I) -> Zipper<I> {
        Zipper {
            id,
            schema: self.clone(),
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        (0..self.data.entities.len()).map(|i| self.zip(EntityId(i)))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = Interface> + '_ {
        (0..self.data.interfaces.len()).map(|i| self.zip(InterfaceId(i)))
    }

    pub fn entity_by_name(&self, name: &str) -> Option<Entity> {
        match self.data.types.get(name)? {
            TypeRef::Entity(id) => Some(self.zip(*id)),
            _ => None,
        }
    }

    pub fn interface_by_name(&self, name: &str) -> Option<Interface> {
        match self.data.types.get(name)? {
            TypeRef::Interface(id) => Some(self.zip(*id)),
            _ => None,
        }
    }

    pub fn union_by_name(&self, name: &str) -> Option<Union> {
        match self.data.types.get(name)? {
            TypeRef::Union(id) => Some(self.zip(*id)),
            _ => None,
        }
    }

    pub fn relationship_properties_by_name(&self, name: &str) -> Option<RelationshipProperties> {
        match self.data.types.get(name)? {
            TypeRef::Properties(id) => Some(self.zip(*id)),
            _ => None,
        }
    }

    /// Looks up a node, interface or union by name.
    pub fn composite_by_name(&self, name: &str) -> Option<CompositeType> {
        match self.data.types.get(name)? {
            TypeRef::Entity(id) => Some(CompositeType::Entity(self.zip(*id))),
            TypeRef::Interface(id) => Some(CompositeType::Interface(self.zip(*id))),
            TypeRef::Union(id) => Some(CompositeType::Union(self.zip(*id))),
            TypeRef::Properties(_) => None,
        }
    }

    pub fn relationship_fields_of(&self, entity: &Entity) -> Vec<RelationField> {
        entity.relation_fields()
    }

    /// Concrete node types behind an interface or union. `None` for unknown names and for nodes.
    pub fn implementations_of(&self, name: &str) -> Option<Vec<Entity>> {
        match self.composite_by_name(name)? {
            CompositeType::Entity(_) => None,
            abstract_type => Some(abstract_type.concrete_entities()),
        }
    }

    pub fn authorization_rules_of(&self, entity: &Entity, operation: AuthorizationOperation) -> Vec<AuthorizationRule> {
        entity.authorization_rules(operation).cloned().collect()
    }
}
