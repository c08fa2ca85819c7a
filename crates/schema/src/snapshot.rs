use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::FieldDescriptor;

/// Fields of one entity, in first-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
	pub fields: IndexMap<Box<str>, FieldDescriptor>,
}

impl EntitySchema {
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.get(name)
	}

	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(|name| &**name)
	}
}

/// Independent copy of every declared entity and its fields.
///
/// Taken once the declaration phase ends; later changes to the composer are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSnapshot {
	pub(crate) entities: BTreeMap<Box<str>, EntitySchema>,
}

impl SchemaSnapshot {
	pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
		self.entities.get(name)
	}

	pub fn field(&self, entity: &str, field: &str) -> Option<&FieldDescriptor> {
		self.entity(entity)?.field(field)
	}

	/// Entity names, sorted.
	pub fn entity_names(&self) -> impl Iterator<Item = &str> {
		self.entities.keys().map(|name| &**name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &EntitySchema)> {
		self.entities.iter().map(|(name, schema)| (&**name, schema))
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}
}
