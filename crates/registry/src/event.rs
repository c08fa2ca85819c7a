use std::sync::Arc;

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	/// A new key was inserted.
	Added,
	/// A forced add overwrote an existing key.
	Replaced,
	/// A key was removed.
	Removed,
}

/// Change notification delivered to category subscribers after publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
	pub category: Box<str>,
	pub key: Box<str>,
	pub operation: Operation,
}

/// Identifies a subscription for [`crate::Category::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;
