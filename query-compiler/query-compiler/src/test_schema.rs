use query_structure::{Schema, definition::SchemaDefinition};

pub(crate) fn movies() -> Schema {
    let definition = SchemaDefinition::from_json(include_str!("../tests/fixtures/movies.json")).unwrap();
    Schema::build(definition).unwrap()
}
