//! Extensions submitted through `inventory` and installed into the process-wide state.

use std::sync::{Arc, LazyLock};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use serial_test::serial;
use strata_extensions::patch::{Overlay, Target};
use strata_extensions::registry::RegistryError;
use strata_extensions::schema::FieldDescriptor;
use strata_extensions::{Config, ExtensionContext, ExtensionsConfig, install_extensions, registry, schema};

/// Mock transport route handler.
type RpcHandler = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
/// Method of the lead form component.
type FormMethod = Arc<dyn Fn(&Value) -> String + Send + Sync>;

static LEAD_FORM: LazyLock<Target<FormMethod>> = LazyLock::new(|| {
	let stage_label: FormMethod = Arc::new(|record: &Value| record["stage"].as_str().unwrap_or("New").to_string());
	Target::new("crm.lead.form", [("stage_label", stage_label)])
});

fn rpc(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> RpcHandler {
	Arc::new(f)
}

fn install_mock_rpc(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	let routes = cx.category("mock_rpc");
	routes.add("get_stages", rpc(|_| json!(["New", "Qualified", "Won"])))?;
	routes.add("web_read", rpc(|args| json!({ "id": args["id"], "stage": "Qualified" })))?;
	cx.schema().declare_entities(["crm.lead", "crm.stage"]);
	Ok(())
}

fn install_forecast(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	cx.patch(
		&*LEAD_FORM,
		Overlay::labeled("crm.forecast").override_method("stage_label", |prev: FormMethod| {
			let wrapped: FormMethod =
				Arc::new(move |record: &Value| format!("{} ({}%)", prev(record), record["probability"].as_u64().unwrap_or(0)));
			wrapped
		}),
	)?;
	cx.schema().merge_fields(
		"crm.lead",
		[("probability", FieldDescriptor::new().with("type", "float").with("default", 10))],
	);
	Ok(())
}

fn install_broken(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
	cx.patch(&*LEAD_FORM, Overlay::new().override_method("missing", |prev: FormMethod| prev))?;
	Ok(())
}

strata_extensions::extension!("crm.mock_rpc", install_mock_rpc);
strata_extensions::extension!("crm.forecast", priority: 10, install_forecast);
strata_extensions::extension!("crm.broken", priority: 5, install_broken);

fn dispatch(route: &str, args: &Value) -> Result<Value, RegistryError> {
	let handler = registry().category("mock_rpc").get::<RpcHandler>(route)?;
	Ok(handler(args))
}

#[test]
#[serial]
fn test_install_discovered_extensions_once() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();

	let config = Config {
		extensions: ExtensionsConfig {
			disabled: vec!["crm.broken".into()],
		},
		..Config::default()
	};

	let report = install_extensions(&config).unwrap();
	assert_eq!(report.installed, vec!["crm.mock_rpc", "crm.forecast"]);
	assert_eq!(report.skipped, vec!["crm.broken"]);
	assert_eq!(report.layers.len(), 1);
	assert_eq!(report.layers[0].extension, "crm.forecast");
	assert_eq!(&*report.layers[0].target, "crm.lead.form");

	// Mock transport dispatch resolves handlers by route.
	assert_eq!(dispatch("get_stages", &Value::Null).unwrap(), json!(["New", "Qualified", "Won"]));
	assert_eq!(dispatch("web_read", &json!({ "id": 7 })).unwrap(), json!({ "id": 7, "stage": "Qualified" }));
	assert!(matches!(dispatch("unlink", &Value::Null), Err(RegistryError::NotFound(_))));

	// The patched component calls through to the original.
	let stage_label = LEAD_FORM.resolve("stage_label").unwrap();
	assert_eq!(stage_label(&json!({ "stage": "Won", "probability": 100 })), "Won (100%)");

	let snapshot = schema().snapshot();
	assert_eq!(snapshot.entity_names().collect::<Vec<_>>(), vec!["crm.lead", "crm.stage"]);
	assert_eq!(snapshot.field("crm.lead", "probability").and_then(FieldDescriptor::default_value), Some(&json!(10)));

	// Second pass does nothing.
	let again = install_extensions(&config).unwrap();
	assert!(again.installed.is_empty());
	assert_eq!(LEAD_FORM.depth("stage_label"), 1);
}
