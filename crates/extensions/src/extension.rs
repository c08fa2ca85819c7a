//! Module-initialization discovery of extensions.
//!
//! Extensions are plain functions submitted with [`crate::extension!`]. They are collected
//! with `inventory` and run once, in ascending priority then name order, against the
//! process-wide registry and schema composer.

use parking_lot::Mutex;
use strata_patch::{LayerId, Overlay, PatchHandle, Target};
use strata_registry::{Category, Registry};
use strata_schema::SchemaComposer;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Install function of an extension.
pub type InstallFn = fn(&mut ExtensionContext<'_>) -> Result<()>;

/// A discoverable extension module.
pub struct ExtensionDef {
	/// Unique name; used by [`crate::config::ExtensionsConfig::disabled`].
	pub name: &'static str,
	/// Lower priorities install first. Later patches resolve first at call time.
	pub priority: i16,
	pub install: InstallFn,
}

inventory::collect!(ExtensionDef);

impl ExtensionDef {
	pub const fn new(name: &'static str, priority: i16, install: InstallFn) -> Self {
		Self { name, priority, install }
	}
}

impl std::fmt::Debug for ExtensionDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExtensionDef")
			.field("name", &self.name)
			.field("priority", &self.priority)
			.finish()
	}
}

/// Submits an extension for discovery by [`install_extensions`].
///
/// ```ignore
/// fn install(cx: &mut ExtensionContext<'_>) -> strata_extensions::Result<()> {
/// 	cx.category("mock_rpc").add("web_read", handler)?;
/// 	Ok(())
/// }
///
/// strata_extensions::extension!("crm.mock_rpc", install);
/// ```
#[macro_export]
macro_rules! extension {
	($name:literal, priority: $priority:expr, $install:path $(,)?) => {
		$crate::inventory::submit! {
			$crate::ExtensionDef::new($name, $priority, $install)
		}
	};
	($name:literal, $install:path $(,)?) => {
		$crate::extension!($name, priority: 0, $install);
	};
}

/// A layer installed by an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLayer {
	pub extension: &'static str,
	pub target: Box<str>,
	pub layer: LayerId,
}

/// Outcome of an install pass.
#[derive(Debug, Default)]
pub struct InstallReport {
	/// Installed extensions, in install order.
	pub installed: Vec<&'static str>,
	/// Extensions skipped because configuration disabled them.
	pub skipped: Vec<&'static str>,
	/// Patch layers applied through [`ExtensionContext::patch`].
	pub layers: Vec<InstalledLayer>,
	/// Fixture manifests applied.
	pub manifests: usize,
}

/// What an extension sees while installing.
pub struct ExtensionContext<'a> {
	extension: &'static str,
	registry: &'a Registry,
	schema: &'a SchemaComposer,
	layers: &'a mut Vec<InstalledLayer>,
}

impl<'a> ExtensionContext<'a> {
	/// Name of the extension being installed.
	pub fn extension(&self) -> &'static str {
		self.extension
	}

	pub fn registry(&self) -> &'a Registry {
		self.registry
	}

	pub fn schema(&self) -> &'a SchemaComposer {
		self.schema
	}

	/// Shorthand for `registry().category(name)`.
	pub fn category(&self, name: &str) -> std::sync::Arc<Category> {
		self.registry.category(name)
	}

	/// Applies `overlay` to `target` and records the layer in the install report.
	pub fn patch<M: Clone>(&mut self, target: &Target<M>, overlay: Overlay<M>) -> Result<PatchHandle<M>> {
		let handle = target.apply(overlay)?;
		self.layers.push(InstalledLayer {
			extension: self.extension,
			target: Box::from(target.label()),
			layer: handle.layer(),
		});
		Ok(handle)
	}
}

/// Installs `defs` against the given registry and schema composer.
///
/// Fixture manifests named by `config` are applied after every extension ran, so manifests
/// have the last word on field descriptors.
pub fn install_with<'d, I>(defs: I, registry: &Registry, schema: &SchemaComposer, config: &Config) -> Result<InstallReport>
where
	I: IntoIterator<Item = &'d ExtensionDef>,
{
	let mut defs: Vec<&ExtensionDef> = defs.into_iter().collect();
	defs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));

	let mut report = InstallReport::default();
	for def in defs {
		if config.is_disabled(def.name) {
			debug!(extension = def.name, "extension disabled by config");
			report.skipped.push(def.name);
			continue;
		}

		let before = report.layers.len();
		let mut cx = ExtensionContext {
			extension: def.name,
			registry,
			schema,
			layers: &mut report.layers,
		};
		(def.install)(&mut cx).map_err(|source| Error::Extension {
			name: def.name,
			source: Box::new(source),
		})?;

		info!(extension = def.name, priority = def.priority, layers = report.layers.len() - before, "installed extension");
		report.installed.push(def.name);
	}

	for manifest in &config.fixtures.manifests {
		schema.load_manifest(manifest)?;
		report.manifests += 1;
	}

	Ok(report)
}

enum InstallState {
	Pending,
	Installed,
	Failed(Box<str>),
}

static INSTALLED: Mutex<InstallState> = Mutex::new(InstallState::Pending);

/// Installs every submitted extension into the process-wide registry and schema composer.
///
/// Runs once per process; later calls return an empty report. If the first pass fails, later
/// calls fail with [`Error::InstallAborted`] instead of re-running extensions against the
/// partially installed state.
pub fn install_extensions(config: &Config) -> Result<InstallReport> {
	let mut state = INSTALLED.lock();
	match &*state {
		InstallState::Installed => {
			debug!("extensions already installed");
			return Ok(InstallReport::default());
		}
		InstallState::Failed(reason) => return Err(Error::InstallAborted { reason: reason.clone() }),
		InstallState::Pending => {}
	}

	match install_with(inventory::iter::<ExtensionDef>, crate::registry(), crate::schema(), config) {
		Ok(report) => {
			*state = InstallState::Installed;
			Ok(report)
		}
		Err(error) => {
			*state = InstallState::Failed(error.to_string().into());
			Err(error)
		}
	}
}
