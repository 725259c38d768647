//! Declarative schema input.
//!
//! These types are the boundary with the schema-definition front end: it hands over an already
//! parsed [`SchemaDefinition`] (usually as JSON) and [`crate::Schema::build`] turns it into the
//! immutable, validated schema used by the compiler.

use crate::{AuthorizationOperation, DuplicationPolicy, NestedOperation, RelationDirection, TimestampOperation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDefinition>,
    #[serde(default)]
    pub unions: Vec<UnionDefinition>,
    #[serde(default)]
    pub relationship_properties: Vec<RelationshipPropertiesDefinition>,
}

impl SchemaDefinition {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub name: String,
    /// Database labels. Defaults to the type name.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub authorization: Vec<AuthorizationRuleDefinition>,
    #[serde(default)]
    pub limit: Option<QueryLimit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionDefinition {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipPropertiesDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLimit {
    pub default: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    /// A scalar type name (`ID`, `String`, `Int`, ...) or the name of a node, interface or union.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub unique: bool,
    /// Generate a UUID on create.
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub coalesce: Option<serde_json::Value>,
    /// Database property name when it differs from the field name.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub timestamps: Vec<TimestampOperation>,
    #[serde(default)]
    pub cypher: Option<CypherAnnotation>,
    #[serde(default)]
    pub custom_resolver: Option<CustomResolverAnnotation>,
    #[serde(default)]
    pub relationship: Option<RelationshipAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CypherAnnotation {
    pub statement: String,
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResolverAnnotation {
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAnnotation {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub direction: RelationDirection,
    #[serde(default)]
    pub undirected_queries: bool,
    #[serde(default)]
    pub properties: Option<String>,
    #[serde(default)]
    pub duplicates: DuplicationPolicy,
    #[serde(default)]
    pub non_empty: bool,
    /// `None` allows every nested operation.
    #[serde(default)]
    pub nested_operations: Option<Vec<NestedOperation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRuleDefinition {
    pub kind: RuleKind,
    #[serde(default)]
    pub operations: Option<Vec<AuthorizationOperation>>,
    /// Only meaningful for validate rules. Defaults to both.
    #[serde(default)]
    pub when: Option<Vec<ValidationWhen>>,
    #[serde(default = "default_requires_authentication")]
    pub requires_authentication: bool,
    #[serde(default, rename = "where")]
    pub where_: Option<AuthorizationWhere>,
}

fn default_requires_authentication() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationWhere {
    /// Filter over the node, in the filter input language. `"$jwt.<claim>"` strings refer to claims.
    #[serde(default)]
    pub node: Option<serde_json::Map<String, serde_json::Value>>,
    /// Filter over the claims of the request.
    #[serde(default)]
    pub jwt: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    Filter,
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationWhen {
    Before,
    After,
}
