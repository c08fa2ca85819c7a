//! Process-wide extension points.
//!
//! This crate ties the layer engine, the registry, and the schema composer together for an
//! application whose modules extend shared behavior at load time.
//!
//! # Sub-crates
//!
//! - [`patch`] - Layered overlays with call-through on shared method tables
//! - [`registry`] - Categorized keyed tables of extension points
//! - [`schema`] - Entity and field overlays for test fixtures
//!
//! # Lifecycle
//!
//! 1. Modules submit an [`ExtensionDef`] with [`extension!`].
//! 2. Startup loads [`Config`] (see [`load_config_from_dir`]) and calls [`install_extensions`].
//! 3. Runtime code reads [`registry()`], resolves patched targets, and takes
//!    [`schema()`]`.snapshot()` when fixtures are assembled.

mod config;
mod error;
mod extension;

use std::sync::LazyLock;

pub use config::{CONFIG_LAYERS, Config, ConfigError, ConfigLoadReport, ExtensionsConfig, FixturesConfig, load_config_from_dir};
pub use error::{Error, Result};
pub use extension::{ExtensionContext, ExtensionDef, InstallFn, InstallReport, InstalledLayer, install_extensions, install_with};
#[doc(hidden)]
pub use inventory;
pub use {strata_patch as patch, strata_registry as registry, strata_schema as schema};

static REGISTRY: LazyLock<strata_registry::Registry> = LazyLock::new(strata_registry::Registry::new);
static SCHEMA: LazyLock<strata_schema::SchemaComposer> = LazyLock::new(strata_schema::SchemaComposer::new);

/// The process-wide registry.
pub fn registry() -> &'static strata_registry::Registry {
	&REGISTRY
}

/// The process-wide schema composer.
pub fn schema() -> &'static strata_schema::SchemaComposer {
	&SCHEMA
}
