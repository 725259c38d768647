//! The requests the compiler accepts, as handed over by the query front end.

use crate::input::InputMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    Read(ReadOperation),
    Aggregate(AggregateOperation),
    Create(CreateOperation),
    Update(UpdateOperation),
    Delete(DeleteOperation),
}

impl Operation {
    pub fn from_json(json: &str) -> serde_json::Result<Operation> {
        serde_json::from_str(json)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read(_) => "read",
            Operation::Aggregate(_) => "aggregate",
            Operation::Create(_) => "create",
            Operation::Update(_) => "update",
            Operation::Delete(_) => "delete",
        }
    }

    /// Name of the node, interface or union the operation starts from.
    pub fn target(&self) -> &str {
        match self {
            Operation::Read(op) => &op.target,
            Operation::Aggregate(op) => &op.target,
            Operation::Create(op) => &op.target,
            Operation::Update(op) => &op.target,
            Operation::Delete(op) => &op.target,
        }
    }
}

/// Reads nodes of a type with `where`, `options { sort, limit, offset }` and a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOperation {
    pub target: String,
    #[serde(default, rename = "where")]
    pub filter: Option<InputMap>,
    #[serde(default)]
    pub options: Option<InputMap>,
    #[serde(default)]
    pub selection: Selection,
}

/// Aggregates over the nodes of a type: `count` and per-field aggregations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOperation {
    pub target: String,
    #[serde(default, rename = "where")]
    pub filter: Option<InputMap>,
    #[serde(default)]
    pub selection: Selection,
}

/// Creates one node per input object, with nested writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperation {
    pub target: String,
    pub input: Vec<InputMap>,
    #[serde(default)]
    pub selection: Selection,
}

/// Updates the matched nodes. Scalar keys of `update` are set, relationship keys hold nested
/// writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOperation {
    pub target: String,
    #[serde(default, rename = "where")]
    pub filter: Option<InputMap>,
    #[serde(default)]
    pub update: InputMap,
    #[serde(default)]
    pub selection: Selection,
}

/// Deletes the matched nodes, after the nested deletes of `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOperation {
    pub target: String,
    #[serde(default, rename = "where")]
    pub filter: Option<InputMap>,
    #[serde(default)]
    pub delete: InputMap,
}

/// Requested fields. Fields under `on` are only selected on the named concrete type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub fields: Vec<SelectedField>,
    #[serde(default)]
    pub on: IndexMap<String, Vec<SelectedField>>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.on.values().all(Vec::is_empty)
    }

    /// Fields selected on nodes of a concrete type: the common ones, then the type specific ones.
    pub fn fields_for(&self, type_name: &str) -> Vec<&SelectedField> {
        let specific = self.on.get(type_name).into_iter().flatten();
        self.fields.iter().chain(specific).collect()
    }

    pub fn find(&self, name: &str) -> Option<&SelectedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedField {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub arguments: InputMap,
    #[serde(default)]
    pub selection: Selection,
}

impl SelectedField {
    /// The key of the field in the result.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}
