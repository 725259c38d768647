use crate::{
    definition::{FieldDefinition, SchemaDefinition},
    field::{ComputedFieldData, ComputedReturnRef, RelationFieldData, ScalarFieldData, TargetRef},
    fields::{FieldSet, FieldSlot},
    schema::{EntityData, InterfaceData, PropertiesData, SchemaData, TypeRef, UnionData},
    EntityId, InterfaceId, PropertiesId, ScalarType, Schema, SchemaValidationError, UnionId,
};
use graph_value::GraphValue;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

type BuildResult<T> = Result<T, SchemaValidationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Node,
    Interface,
    Properties,
}

impl Schema {
    /// Validates a declarative definition and builds the immutable schema from it.
    pub fn build(definition: SchemaDefinition) -> BuildResult<Schema> {
        let types = register_types(&definition)?;
        let mut data = SchemaData::default();

        for interface in &definition.interfaces {
            data.interfaces.push(InterfaceData {
                name: interface.name.clone(),
                fields: build_fields(&types, &interface.name, &interface.fields, ContainerKind::Interface)?,
                implementations: Vec::new(),
            });
        }

        for properties in &definition.relationship_properties {
            data.properties.push(PropertiesData {
                name: properties.name.clone(),
                fields: build_fields(&types, &properties.name, &properties.fields, ContainerKind::Properties)?,
            });
        }

        for (index, node) in definition.nodes.iter().enumerate() {
            let mut implements = Vec::with_capacity(node.implements.len());

            for interface in &node.implements {
                match types.get(interface) {
                    Some(TypeRef::Interface(id)) => {
                        implements.push(*id);
                        data.interfaces[id.0].implementations.push(EntityId(index));
                    }
                    _ => {
                        return Err(SchemaValidationError::UnknownInterface {
                            entity: node.name.clone(),
                            interface: interface.clone(),
                        });
                    }
                }
            }

            let labels = if node.labels.is_empty() {
                vec![node.name.clone()]
            } else {
                node.labels.clone()
            };

            data.entities.push(EntityData {
                name: node.name.clone(),
                labels,
                implements,
                fields: build_fields(&types, &node.name, &node.fields, ContainerKind::Node)?,
                authorization: node.authorization.iter().cloned().map(Into::into).collect(),
                limit: node.limit,
            });
        }

        for union in &definition.unions {
            let mut members = Vec::with_capacity(union.members.len());

            for member in &union.members {
                match types.get(member) {
                    Some(TypeRef::Entity(id)) => members.push(*id),
                    _ => {
                        return Err(SchemaValidationError::InvalidUnionMember {
                            union: union.name.clone(),
                            member: member.clone(),
                        });
                    }
                }
            }

            data.unions.push(UnionData {
                name: union.name.clone(),
                members,
            });
        }

        validate_implementations(&data)?;
        data.types = types;

        Ok(Schema { data: Arc::new(data) })
    }
}

fn register_types(definition: &SchemaDefinition) -> BuildResult<HashMap<String, TypeRef>> {
    let mut types = HashMap::new();

    let names = definition
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (&n.name, TypeRef::Entity(EntityId(i))))
        .chain(
            definition
                .interfaces
                .iter()
                .enumerate()
                .map(|(i, n)| (&n.name, TypeRef::Interface(InterfaceId(i)))),
        )
        .chain(
            definition
                .unions
                .iter()
                .enumerate()
                .map(|(i, n)| (&n.name, TypeRef::Union(UnionId(i)))),
        )
        .chain(
            definition
                .relationship_properties
                .iter()
                .enumerate()
                .map(|(i, n)| (&n.name, TypeRef::Properties(PropertiesId(i)))),
        );

    for (name, type_ref) in names {
        if ScalarType::parse(name).is_some() || types.insert(name.clone(), type_ref).is_some() {
            return Err(SchemaValidationError::DuplicateType { name: name.clone() });
        }
    }

    Ok(types)
}

fn build_fields(
    types: &HashMap<String, TypeRef>,
    container: &str,
    definitions: &[FieldDefinition],
    kind: ContainerKind,
) -> BuildResult<FieldSet> {
    let mut set = FieldSet::default();
    let mut seen = HashSet::new();
    let declared: HashSet<&str> = definitions.iter().map(|f| f.name.as_str()).collect();

    for field in definitions {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaValidationError::DuplicateField {
                container: container.to_owned(),
                field: field.name.clone(),
            });
        }

        if field.relationship.is_some() {
            let data = relation_field(types, container, field, kind)?;
            set.order.push(FieldSlot::Relation(set.relations.len()));
            set.relations.push(data);
        } else if field.cypher.is_some() {
            let data = computed_field(types, container, field, kind)?;
            set.order.push(FieldSlot::Computed(set.computed.len()));
            set.computed.push(data);
        } else {
            let data = scalar_field(types, container, field, &declared)?;
            set.order.push(FieldSlot::Scalar(set.scalars.len()));
            set.scalars.push(data);
        }
    }

    Ok(set)
}

fn relation_field(
    types: &HashMap<String, TypeRef>,
    container: &str,
    field: &FieldDefinition,
    kind: ContainerKind,
) -> BuildResult<RelationFieldData> {
    let incompatible = |annotation, reason: &str| {
        Err(SchemaValidationError::incompatible(
            container,
            &field.name,
            annotation,
            reason,
        ))
    };

    let Some(relationship) = &field.relationship else {
        return incompatible("relationship", "missing relationship annotation");
    };

    if kind == ContainerKind::Properties {
        return incompatible("relationship", "relationship properties cannot declare relationships");
    }

    if field.cypher.is_some() {
        return incompatible("cypher", "a relationship field cannot also be computed");
    }

    if field.id || field.unique {
        return incompatible("unique", "relationship fields cannot be unique");
    }

    if field.default.is_some() || field.coalesce.is_some() || field.generated || !field.timestamps.is_empty() {
        return incompatible("default", "relationship fields have no stored value");
    }

    if relationship.non_empty && !field.list {
        return incompatible("nonEmpty", "only list relationships can be non-empty");
    }

    let target = match types.get(&field.type_name) {
        Some(TypeRef::Entity(id)) => TargetRef::Entity(*id),
        Some(TypeRef::Interface(id)) => TargetRef::Interface(*id),
        Some(TypeRef::Union(id)) => TargetRef::Union(*id),
        _ => {
            return Err(SchemaValidationError::UnknownType {
                container: container.to_owned(),
                field: field.name.clone(),
                target: field.type_name.clone(),
            });
        }
    };

    let properties = match &relationship.properties {
        None => None,
        Some(name) => match types.get(name) {
            Some(TypeRef::Properties(id)) => Some(*id),
            _ => {
                return Err(SchemaValidationError::UnknownRelationshipProperties {
                    container: container.to_owned(),
                    field: field.name.clone(),
                    properties: name.clone(),
                });
            }
        },
    };

    Ok(RelationFieldData {
        name: field.name.clone(),
        rel_type: relationship.rel_type.clone(),
        direction: relationship.direction,
        undirected_queries: relationship.undirected_queries,
        target,
        properties,
        list: field.list,
        required: field.required,
        non_empty: relationship.non_empty,
        duplicates: relationship.duplicates,
        nested_operations: relationship.nested_operations.clone(),
    })
}

fn computed_field(
    types: &HashMap<String, TypeRef>,
    container: &str,
    field: &FieldDefinition,
    kind: ContainerKind,
) -> BuildResult<ComputedFieldData> {
    let incompatible = |annotation, reason: &str| {
        Err(SchemaValidationError::incompatible(
            container,
            &field.name,
            annotation,
            reason,
        ))
    };

    let Some(cypher) = &field.cypher else {
        return incompatible("cypher", "missing cypher annotation");
    };

    if kind == ContainerKind::Properties {
        return incompatible("cypher", "relationship properties cannot be computed");
    }

    if field.id || field.unique {
        return incompatible("cypher", "computed fields cannot be unique");
    }

    if field.default.is_some() || field.generated || !field.timestamps.is_empty() {
        return incompatible("default", "computed fields have no stored value");
    }

    if field.custom_resolver.is_some() {
        return incompatible("customResolver", "a computed field cannot also have a custom resolver");
    }

    let returns = match ScalarType::parse(&field.type_name) {
        Some(tpe) => ComputedReturnRef::Scalar(tpe),
        None => match types.get(&field.type_name) {
            Some(TypeRef::Entity(id)) => ComputedReturnRef::Entity(*id),
            Some(_) => return incompatible("cypher", "computed fields must return a scalar or a node type"),
            None => {
                return Err(SchemaValidationError::UnknownType {
                    container: container.to_owned(),
                    field: field.name.clone(),
                    target: field.type_name.clone(),
                });
            }
        },
    };

    Ok(ComputedFieldData {
        name: field.name.clone(),
        statement: cypher.statement.clone(),
        column_name: cypher.column_name.clone(),
        list: field.list,
        returns,
    })
}

fn scalar_field(
    types: &HashMap<String, TypeRef>,
    container: &str,
    field: &FieldDefinition,
    declared: &HashSet<&str>,
) -> BuildResult<ScalarFieldData> {
    let incompatible = |annotation, reason: &str| {
        Err(SchemaValidationError::incompatible(
            container,
            &field.name,
            annotation,
            reason,
        ))
    };

    let Some(type_identifier) = ScalarType::parse(&field.type_name) else {
        if types.contains_key(&field.type_name) {
            return incompatible("relationship", "fields of a composite type need a relationship annotation");
        }

        return Err(SchemaValidationError::UnknownType {
            container: container.to_owned(),
            field: field.name.clone(),
            target: field.type_name.clone(),
        });
    };

    if field.generated && (type_identifier != ScalarType::Id || field.list) {
        return incompatible("generated", "only singular ID fields can be generated");
    }

    if !field.timestamps.is_empty() && (type_identifier != ScalarType::DateTime || field.list) {
        return incompatible("timestamp", "only singular DateTime fields can hold timestamps");
    }

    if field.list && type_identifier == ScalarType::Point && field.coalesce.is_some() {
        return incompatible("coalesce", "point lists cannot be coalesced");
    }

    if let Some(resolver) = &field.custom_resolver {
        if field.id || field.unique {
            return incompatible("customResolver", "custom resolved fields cannot be unique");
        }

        if let Some(missing) = resolver.requires.iter().find(|r| !declared.contains(r.as_str())) {
            return incompatible(
                "customResolver",
                format!("required field `{missing}` does not exist").as_str(),
            );
        }
    }

    Ok(ScalarFieldData {
        name: field.name.clone(),
        alias: field.alias.clone(),
        type_identifier,
        list: field.list,
        required: field.required,
        id: field.id,
        unique: field.unique,
        generated: field.generated,
        default: convert_value(container, field, field.default.as_ref())?,
        coalesce: convert_value(container, field, field.coalesce.as_ref())?,
        timestamps: field.timestamps.clone(),
        custom_resolver: field.custom_resolver.as_ref().map(|r| r.requires.clone()),
    })
}

fn convert_value(
    container: &str,
    field: &FieldDefinition,
    value: Option<&serde_json::Value>,
) -> BuildResult<Option<GraphValue>> {
    value
        .cloned()
        .map(GraphValue::try_from)
        .transpose()
        .map_err(|err| SchemaValidationError::InvalidValue {
            container: container.to_owned(),
            field: field.name.clone(),
            reason: err.to_string(),
        })
}

fn validate_implementations(data: &SchemaData) -> BuildResult<()> {
    for interface in &data.interfaces {
        for entity_id in &interface.implementations {
            let entity = &data.entities[entity_id.0];

            for slot in &interface.fields.order {
                let field = interface.fields.slot_name(*slot);

                if entity.fields.find(field).is_none() {
                    return Err(SchemaValidationError::MissingInterfaceField {
                        entity: entity.name.clone(),
                        interface: interface.name.clone(),
                        field: field.to_owned(),
                    });
                }
            }
        }
    }

    Ok(())
}
