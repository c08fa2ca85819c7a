use strata_patch::PatchError;
use strata_registry::RegistryError;
use strata_schema::SchemaError;

use crate::config::ConfigError;

/// Any failure surfaced while installing extensions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Patch(#[from] PatchError),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Schema(#[from] SchemaError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	/// An extension's install function failed.
	#[error("extension `{name}` failed to install: {source}")]
	Extension {
		name: &'static str,
		#[source]
		source: Box<Error>,
	},

	/// An earlier install pass failed part-way; the process-wide state is incomplete.
	#[error("an earlier extension install pass failed: {reason}")]
	InstallAborted { reason: Box<str> },
}

/// Result type for extension operations.
pub type Result<T> = std::result::Result<T, Error>;
