use indexmap::IndexMap;

/// Builds one layer's implementation from the call-through it wraps.
pub(crate) enum Entry<M> {
	/// Requires a prior definition.
	Override(Box<dyn FnOnce(M) -> M>),
	/// Wraps the prior definition if there is one, adds the name otherwise.
	Define(Box<dyn FnOnce(Option<M>) -> M>),
}

impl<M> Entry<M> {
	pub(crate) fn requires_base(&self) -> bool {
		matches!(self, Entry::Override(_))
	}
}

/// A named set of replacements applied to a [`crate::Target`] as one layer.
///
/// Entries are keyed by name. Adding a second entry for the same name replaces the first.
///
/// ```ignore
/// let overlay = Overlay::labeled("crm.lead_form")
/// 	.override_method("setup", |prev: Setup| Arc::new(move |ctx| { prev(ctx); ctx.load_stages() }))
/// 	.define("onStageChanged", |_| Arc::new(|ctx| ctx.reload()));
/// ```
pub struct Overlay<M> {
	pub(crate) label: Option<Box<str>>,
	pub(crate) entries: IndexMap<Box<str>, Entry<M>>,
}

impl<M> Default for Overlay<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M> Overlay<M> {
	/// Creates an empty, unlabeled overlay.
	pub fn new() -> Self {
		Self {
			label: None,
			entries: IndexMap::new(),
		}
	}

	/// Creates an empty overlay carrying a diagnostic label.
	pub fn labeled(label: impl Into<Box<str>>) -> Self {
		Self {
			label: Some(label.into()),
			entries: IndexMap::new(),
		}
	}

	/// Overrides `name`, which must already resolve on the target.
	///
	/// `build` receives the implementation `name` resolved to at apply time.
	pub fn override_method<F>(mut self, name: impl Into<Box<str>>, build: F) -> Self
	where
		F: FnOnce(M) -> M + 'static,
	{
		self.entries.insert(name.into(), Entry::Override(Box::new(build)));
		self
	}

	/// Overrides `name` if the target defines it and adds it otherwise.
	///
	/// `build` receives `Some(prior)` when there is something to call through to.
	pub fn define<F>(mut self, name: impl Into<Box<str>>, build: F) -> Self
	where
		F: FnOnce(Option<M>) -> M + 'static,
	{
		self.entries.insert(name.into(), Entry::Define(Box::new(build)));
		self
	}

	/// Installs `implementation` for `name` without calling through.
	pub fn replace(self, name: impl Into<Box<str>>, implementation: M) -> Self
	where
		M: 'static,
	{
		self.define(name, move |_| implementation)
	}

	/// Returns the diagnostic label, if any.
	pub fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	/// Returns the names this overlay touches, in insertion order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(|name| &**name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<M> std::fmt::Debug for Overlay<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Overlay")
			.field("label", &self.label)
			.field("names", &self.entries.keys().collect::<Vec<_>>())
			.finish()
	}
}
