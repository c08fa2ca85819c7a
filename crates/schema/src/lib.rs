//! Entity and field overlays for composing test fixtures.
//!
//! Modules declare which entities a test environment needs and contribute partial field
//! definitions for them. The composer accumulates both during the declaration phase; the
//! fixture builder takes a [`SchemaSnapshot`] when execution starts.
//!
//! Merge rules:
//! - Entity declaration has set semantics.
//! - A field descriptor replaces any earlier descriptor for the same (entity, field) pair.
//!   Descriptors are never deep-merged.
//! - Merging fields declares the entity implicitly.

mod descriptor;
mod error;
mod manifest;
mod snapshot;

use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;

pub use descriptor::FieldDescriptor;
pub use error::{Result, SchemaError};
pub use manifest::FixtureManifest;
pub use snapshot::{EntitySchema, SchemaSnapshot};

/// Accumulates entity declarations and field overlays.
#[derive(Debug, Default)]
pub struct SchemaComposer {
	entities: RwLock<BTreeMap<Box<str>, EntitySchema>>,
}

impl SchemaComposer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds each name to the discovered-entity set. Names already present are left as is.
	pub fn declare_entities<I, S>(&self, names: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		let mut entities = self.entities.write();
		for name in names {
			entities.entry(name.into()).or_default();
		}
	}

	/// Merges `fields` into `entity`, declaring it if needed.
	///
	/// Each descriptor replaces the previous one for that field.
	pub fn merge_fields<I, K>(&self, entity: &str, fields: I)
	where
		I: IntoIterator<Item = (K, FieldDescriptor)>,
		K: Into<Box<str>>,
	{
		let mut entities = self.entities.write();
		let schema = entities.entry(Box::from(entity)).or_default();
		let before = schema.fields.len();
		for (name, descriptor) in fields {
			schema.fields.insert(name.into(), descriptor);
		}
		debug!(entity, added = schema.fields.len() - before, total = schema.fields.len(), "merged fields");
	}

	pub fn contains_entity(&self, name: &str) -> bool {
		self.entities.read().contains_key(name)
	}

	/// Declared entity names, sorted.
	pub fn entity_names(&self) -> Vec<Box<str>> {
		self.entities.read().keys().cloned().collect()
	}

	/// Copies the current state.
	pub fn snapshot(&self) -> SchemaSnapshot {
		SchemaSnapshot {
			entities: self.entities.read().clone(),
		}
	}

	/// Applies every declaration in `manifest`.
	pub fn apply_manifest(&self, manifest: &FixtureManifest) {
		self.declare_entities(manifest.entities.iter().cloned());
		for (entity, fields) in &manifest.fields {
			self.merge_fields(entity, fields.iter().map(|(name, descriptor)| (name.clone(), descriptor.clone())));
		}
	}

	/// Loads the manifest at `path` and applies it.
	pub fn load_manifest(&self, path: &Path) -> Result<()> {
		let manifest = FixtureManifest::load(path)?;
		debug!(path = %path.display(), entities = manifest.entities.len(), "loaded fixture manifest");
		self.apply_manifest(&manifest);
		Ok(())
	}
}
