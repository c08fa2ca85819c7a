use std::path::PathBuf;

/// Errors raised while loading fixture manifests.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
	#[error("failed to read fixture manifest {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse fixture manifest {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
