//! The schema model: node types, interfaces, unions and relationship properties, plus the filter
//! and ordering structures expressed over them.

mod authorization;
mod builder;
mod entity;
mod error;
mod field;
mod fields;
mod filter;
mod interface;
mod order_by;
mod relationship_properties;
mod schema;
mod zipper;

pub mod definition;

pub use authorization::*;
pub use definition::{QueryLimit, RuleKind, ValidationWhen};
pub use entity::*;
pub use error::*;
pub use field::*;
pub use fields::FieldContainer;
pub use filter::*;
pub use interface::*;
pub use order_by::*;
pub use relationship_properties::*;
pub use schema::{CompositeType, ContainerId, EntityId, InterfaceId, PropertiesId, Schema, UnionId};
pub use zipper::*;

pub(crate) use fields::FieldSet;
