//! Explicit install passes against local state.

use std::sync::{Arc, LazyLock};

use pretty_assertions::assert_eq;
use serde_json::json;
use strata_extensions::patch::{Overlay, PatchError, Target};
use strata_extensions::registry::{Registry, RegistryError};
use strata_extensions::schema::{FieldDescriptor, SchemaComposer};
use strata_extensions::{Config, Error, ExtensionContext, ExtensionDef, FixturesConfig, install_with};

type Label = Arc<dyn Fn() -> String + Send + Sync>;

static DOCUMENT_VIEW: LazyLock<Target<Label>> = LazyLock::new(|| {
	let title: Label = Arc::new(|| "Document".to_string());
	Target::new("document.view", [("title", title)])
});

fn install_actions(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	cx.category("actions").add(cx.extension(), "open")?;
	Ok(())
}

fn install_title(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	let name = cx.extension();
	cx.patch(
		&*DOCUMENT_VIEW,
		Overlay::labeled(name).override_method("title", move |prev: Label| {
			let wrapped: Label = Arc::new(move || format!("{}/{name}", prev()));
			wrapped
		}),
	)?;
	Ok(())
}

fn install_fields(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	cx.schema().merge_fields("document", [("name", FieldDescriptor::new().with("type", "char"))]);
	Ok(())
}

fn install_duplicate(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	let actions = cx.category("actions");
	actions.add("dup", 1_u8)?;
	actions.add("dup", 2_u8)?;
	Ok(())
}

#[test]
fn test_priority_then_name_order() {
	static DEFS: [ExtensionDef; 3] = [
		ExtensionDef::new("zeta", 0, install_actions),
		ExtensionDef::new("alpha", 0, install_actions),
		ExtensionDef::new("early", -5, install_actions),
	];

	let registry = Registry::new();
	let report = install_with(&DEFS, &registry, &SchemaComposer::new(), &Config::default()).unwrap();

	assert_eq!(report.installed, vec!["early", "alpha", "zeta"]);
	assert_eq!(registry.category("actions").keys(), vec![Box::from("early"), Box::from("alpha"), Box::from("zeta")]);
}

#[test]
fn test_later_extensions_layer_on_top() {
	static DEFS: [ExtensionDef; 2] = [ExtensionDef::new("second", 1, install_title), ExtensionDef::new("first", 0, install_title)];

	let report = install_with(&DEFS, &Registry::new(), &SchemaComposer::new(), &Config::default()).unwrap();
	let title = DOCUMENT_VIEW.resolve("title").unwrap();
	assert_eq!(title(), "Document/first/second");

	let labels: Vec<_> = DOCUMENT_VIEW.active_layers().into_iter().map(|info| info.label).collect();
	assert_eq!(labels, vec![Some(Box::from("first")), Some(Box::from("second"))]);
	assert_eq!(report.layers.iter().map(|l| l.extension).collect::<Vec<_>>(), vec!["first", "second"]);

	let active: Vec<_> = DOCUMENT_VIEW.active_layers().iter().map(|info| info.id).collect();
	assert_eq!(report.layers.iter().map(|l| l.layer).collect::<Vec<_>>(), active);
}

#[test]
fn test_failing_extension_is_named() {
	static DEFS: [ExtensionDef; 2] = [ExtensionDef::new("ok", 0, install_fields), ExtensionDef::new("dup", 1, install_duplicate)];

	let schema = SchemaComposer::new();
	let err = install_with(&DEFS, &Registry::new(), &schema, &Config::default()).unwrap_err();

	let Error::Extension { name, source } = err else {
		panic!("expected an extension error");
	};
	assert_eq!(name, "dup");
	assert!(matches!(*source, Error::Registry(RegistryError::Conflict(_))));
	// Extensions that ran before the failure stay installed.
	assert!(schema.contains_entity("document"));
}

#[test]
fn test_patch_errors_convert() {
	fn install_missing(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
		cx.patch(&*DOCUMENT_VIEW, Overlay::new().override_method("subtitle", |prev: Label| prev))?;
		Ok(())
	}
	static DEFS: [ExtensionDef; 1] = [ExtensionDef::new("missing", 0, install_missing)];

	let err = install_with(&DEFS, &Registry::new(), &SchemaComposer::new(), &Config::default()).unwrap_err();
	let Error::Extension { source, .. } = err else {
		panic!("expected an extension error");
	};
	assert!(matches!(*source, Error::Patch(PatchError::Target(_))));
}

#[test]
fn test_manifests_apply_after_extensions() {
	static DEFS: [ExtensionDef; 1] = [ExtensionDef::new("fields", 0, install_fields)];

	let dir = tempfile::tempdir().unwrap();
	let manifest = dir.path().join("document.toml");
	std::fs::write(&manifest, "entities = [\"tag\"]\n\n[fields.document.name]\ntype = \"text\"\ndefault = \"Untitled\"\n").unwrap();

	let config = Config {
		fixtures: FixturesConfig {
			manifests: vec![manifest],
		},
		..Config::default()
	};
	let schema = SchemaComposer::new();
	let report = install_with(&DEFS, &Registry::new(), &schema, &config).unwrap();

	assert_eq!(report.manifests, 1);
	let snapshot = schema.snapshot();
	assert_eq!(snapshot.entity_names().collect::<Vec<_>>(), vec!["document", "tag"]);
	assert_eq!(
		snapshot.field("document", "name"),
		Some(&FieldDescriptor::new().with("type", "text").with("default", json!("Untitled")))
	);
}

#[test]
fn test_missing_manifest_fails_install() {
	let config = Config {
		fixtures: FixturesConfig {
			manifests: vec!["/nonexistent/strata/fixtures.toml".into()],
		},
		..Config::default()
	};

	let err = install_with(Vec::<&ExtensionDef>::new(), &Registry::new(), &SchemaComposer::new(), &config).unwrap_err();
	assert!(matches!(err, Error::Schema(_)));
}
