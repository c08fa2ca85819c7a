//! Categorized keyed tables of extension points.
//!
//! # Purpose
//!
//! A [`Registry`] maps category names to [`Category`] tables. Modules publish named extension
//! points into a category at initialization time (mock transport handlers, action
//! descriptors, field widgets) and dispatch layers look them up by key later.
//!
//! # Mental Model
//!
//! 1. **Namespaces:** [`Registry::category`] creates a category on first use and returns the
//!    same instance for every later call with that name.
//! 2. **Publication:** [`Category::add`] builds an extended snapshot and swaps it in. Keys are
//!    unique unless the add is forced.
//! 3. **Consumption:** [`Category::get`] downcasts the stored value to the requested type.
//!    Iteration follows insertion order. The order exists for deterministic enumeration and
//!    carries no precedence.
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free (atomic load of the current snapshot).
//! - **Writes:** Lock-free with linearizability (CAS retry loop on add and remove).

mod category;
mod error;
mod event;

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;

pub use category::{AddOptions, Category, Value};
pub use error::{RegistryConflictError, RegistryError, RegistryNotFoundError, RegistryTypeError};
pub use event::{Operation, RegistryEvent, SubscriptionId};

/// Root of all categories.
#[derive(Default)]
pub struct Registry {
	categories: RwLock<HashMap<Box<str>, Arc<Category>>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the category called `name`, creating it on first use.
	pub fn category(&self, name: &str) -> Arc<Category> {
		if let Some(category) = self.categories.read().get(name) {
			return Arc::clone(category);
		}

		let mut categories = self.categories.write();
		let category = categories.entry(Box::from(name)).or_insert_with(|| {
			debug!(category = name, "created registry category");
			Arc::new(Category::new(name))
		});
		Arc::clone(category)
	}

	/// Returns the category called `name` without creating it.
	pub fn get_category(&self, name: &str) -> Option<Arc<Category>> {
		self.categories.read().get(name).cloned()
	}

	/// Names of every created category, sorted.
	pub fn categories(&self) -> Vec<Box<str>> {
		let mut names: Vec<Box<str>> = self.categories.read().keys().cloned().collect();
		names.sort_unstable();
		names
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry").field("categories", &self.categories()).finish()
	}
}
