use std::path::PathBuf;

use pretty_assertions::assert_eq;
use strata_extensions::{Config, ConfigError, ExtensionsConfig, FixturesConfig, load_config_from_dir};

#[test]
fn test_empty_dir_has_no_config() {
	let dir = tempfile::tempdir().unwrap();
	let report = load_config_from_dir(dir.path());

	assert!(report.config.is_none());
	assert!(report.errors.is_empty());
}

#[test]
fn test_layers_merge_in_order() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(
		dir.path().join("strata.toml"),
		"[extensions]\ndisabled = [\"crm.forecast\"]\n\n[fixtures]\nmanifests = [\"fixtures/base.toml\"]\n",
	)
	.unwrap();
	std::fs::write(
		dir.path().join("strata.local.toml"),
		"[extensions]\ndisabled = [\"crm.forecast\", \"voip\"]\n\n[fixtures]\nmanifests = [\"/abs/local.toml\"]\n",
	)
	.unwrap();

	let report = load_config_from_dir(dir.path());
	assert!(report.errors.is_empty());
	assert_eq!(
		report.config,
		Some(Config {
			extensions: ExtensionsConfig {
				disabled: vec!["crm.forecast".into(), "voip".into()],
			},
			fixtures: FixturesConfig {
				manifests: vec![dir.path().join("fixtures/base.toml"), PathBuf::from("/abs/local.toml")],
			},
		})
	);

	let config = report.config.unwrap();
	assert!(config.is_disabled("voip"));
	assert!(!config.is_disabled("crm.mock_rpc"));
}

#[test]
fn test_broken_layer_is_reported_and_skipped() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("strata.toml"), "[extensions]\ndisabled = [\"voip\"]\n").unwrap();
	std::fs::write(dir.path().join("strata.local.toml"), "[extensions\n").unwrap();

	let report = load_config_from_dir(dir.path());
	assert_eq!(report.errors.len(), 1);
	assert!(matches!(&report.errors[0], ConfigError::Parse { path, .. } if path.ends_with("strata.local.toml")));
	assert_eq!(report.config.map(|c| c.extensions.disabled), Some(vec!["voip".to_string()]));
}

#[test]
fn test_unknown_keys_are_rejected() {
	assert!(Config::from_toml_str("[extensions]\nenabled = []\n").is_err());
	assert!(Config::from_toml_str("verbose = true\n").is_err());
	assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
}
