//! Fixture manifests: entity and field declarations loaded from TOML.
//!
//! ```toml
//! entities = ["res.partner", "crm.lead"]
//!
//! [fields."crm.lead".expected_revenue]
//! type = "monetary"
//! default = 0
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::FieldDescriptor;
use crate::error::{Result, SchemaError};

/// Declarative form of a batch of `declare_entities` and `merge_fields` calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureManifest {
	/// Entities to declare, with or without fields.
	#[serde(default)]
	pub entities: Vec<Box<str>>,
	/// Field descriptors keyed by entity, then by field.
	#[serde(default)]
	pub fields: IndexMap<Box<str>, IndexMap<Box<str>, FieldDescriptor>>,
}

impl FixtureManifest {
	/// Parses a manifest from TOML text.
	pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
		toml::from_str(content)
	}

	/// Reads and parses the manifest at `path`.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content).map_err(|source| SchemaError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}
}
