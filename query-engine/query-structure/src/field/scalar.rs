use crate::{ContainerId, ScalarType, TimestampOperation, Zipper};
use graph_value::GraphValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarFieldId {
    pub container: ContainerId,
    pub(crate) index: usize,
}

pub type ScalarField = Zipper<ScalarFieldId>;

#[derive(Debug)]
pub(crate) struct ScalarFieldData {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) type_identifier: ScalarType,
    pub(crate) list: bool,
    pub(crate) required: bool,
    pub(crate) id: bool,
    pub(crate) unique: bool,
    pub(crate) generated: bool,
    pub(crate) default: Option<GraphValue>,
    pub(crate) coalesce: Option<GraphValue>,
    pub(crate) timestamps: Vec<TimestampOperation>,
    pub(crate) custom_resolver: Option<Vec<String>>,
}

impl ScalarField {
    fn data(&self) -> &ScalarFieldData {
        &self.schema.data.fields(self.id.container).scalars[self.id.index]
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// The property name in the database.
    pub fn db_name(&self) -> &str {
        let data = self.data();
        data.alias.as_deref().unwrap_or(&data.name)
    }

    pub fn container_name(&self) -> &str {
        self.schema.data.container_name(self.id.container)
    }

    pub fn type_identifier(&self) -> ScalarType {
        self.data().type_identifier
    }

    pub fn is_list(&self) -> bool {
        self.data().list
    }

    pub fn is_required(&self) -> bool {
        self.data().required
    }

    pub fn is_id(&self) -> bool {
        self.data().id
    }

    pub fn is_unique(&self) -> bool {
        let data = self.data();
        data.id || data.unique
    }

    pub fn is_generated(&self) -> bool {
        self.data().generated
    }

    pub fn default_value(&self) -> Option<&GraphValue> {
        self.data().default.as_ref()
    }

    pub fn coalesce_value(&self) -> Option<&GraphValue> {
        self.data().coalesce.as_ref()
    }

    pub fn has_timestamp(&self, operation: TimestampOperation) -> bool {
        self.data().timestamps.contains(&operation)
    }

    /// Fields that must be fetched for a custom resolver. `None` if the field is stored.
    pub fn custom_resolver_requires(&self) -> Option<&[String]> {
        self.data().custom_resolver.as_deref()
    }

    /// Whether the value is read from the database property.
    pub fn is_stored(&self) -> bool {
        self.data().custom_resolver.is_none()
    }
}

impl std::fmt::Display for ScalarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.container_name(), self.name())
    }
}
