//! Extension configuration.
//!
//! Configuration is read from `strata.toml` and then `strata.local.toml` in a config
//! directory. Later layers extend earlier ones. Relative manifest paths are resolved against
//! the directory of the file that names them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Config file names, lowest precedence first.
pub const CONFIG_LAYERS: [&str; 2] = ["strata.toml", "strata.local.toml"];

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

/// Which discovered extensions to install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionsConfig {
	/// Extension names that are skipped at install time.
	pub disabled: Vec<String>,
}

/// Fixture manifests applied to the schema composer at install time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixturesConfig {
	pub manifests: Vec<PathBuf>,
}

/// Parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub extensions: ExtensionsConfig,
	pub fixtures: FixturesConfig,
}

impl Config {
	/// Parses configuration from TOML text.
	pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(content)
	}

	/// Reads the file at `path`, resolving relative manifest paths against its directory.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let mut config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;

		if let Some(dir) = path.parent() {
			for manifest in &mut config.fixtures.manifests {
				if manifest.is_relative() {
					*manifest = dir.join(&*manifest);
				}
			}
		}
		Ok(config)
	}

	/// Merges another config into this one.
	///
	/// Disabled sets are unioned; manifests from `other` are applied after ours.
	pub fn merge(&mut self, other: Config) {
		for name in other.extensions.disabled {
			if !self.extensions.disabled.contains(&name) {
				self.extensions.disabled.push(name);
			}
		}
		self.fixtures.manifests.extend(other.fixtures.manifests);
	}

	pub fn is_disabled(&self, extension: &str) -> bool {
		self.extensions.disabled.iter().any(|name| name == extension)
	}
}

/// Aggregate result of loading configuration layers.
#[derive(Debug, Default)]
pub struct ConfigLoadReport {
	/// Merged config if any layer was loaded successfully.
	pub config: Option<Config>,
	/// Read or parse errors; the failing layer is skipped.
	pub errors: Vec<ConfigError>,
}

/// Loads and merges [`CONFIG_LAYERS`] from `config_dir`.
///
/// Missing files are skipped silently.
pub fn load_config_from_dir(config_dir: &Path) -> ConfigLoadReport {
	let mut report = ConfigLoadReport::default();
	let mut merged = Config::default();
	let mut found_any = false;

	for filename in CONFIG_LAYERS {
		let path = config_dir.join(filename);
		if !path.exists() {
			continue;
		}

		match Config::load(&path) {
			Ok(layer) => {
				merged.merge(layer);
				found_any = true;
			}
			Err(error) => {
				warn!(%error, "skipping config layer");
				report.errors.push(error);
			}
		}
	}

	if found_any {
		report.config = Some(merged);
	}
	report
}
