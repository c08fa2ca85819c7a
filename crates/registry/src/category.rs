//! A single namespace of keyed extension points.
//!
//! # Invariants
//!
//! - Keys are unique; a second add without `force` is rejected and publishes nothing.
//! - A forced overwrite keeps the key's original insertion position.
//! - Concurrent writers never lose an update (CAS retry against the snapshot they read).

use std::any::{Any, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{RegistryConflictError, RegistryError, RegistryNotFoundError, RegistryTypeError};
use crate::event::{Listener, Operation, RegistryEvent, SubscriptionId};

/// Type-erased registry value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Options for [`Category::add_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
	/// Overwrite an existing key instead of failing.
	pub force: bool,
}

impl AddOptions {
	pub const fn force() -> Self {
		Self { force: true }
	}
}

#[derive(Clone)]
struct Slot {
	value: Value,
	type_name: &'static str,
}

type Table = IndexMap<Box<str>, Slot>;

/// A named keyed table. Obtain one through [`crate::Registry::category`].
pub struct Category {
	name: Box<str>,
	snap: ArcSwap<Table>,
	listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
	next_subscription: AtomicU64,
}

impl std::fmt::Debug for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Category").field("name", &self.name).field("keys", &self.keys()).finish()
	}
}

impl Category {
	pub(crate) fn new(name: &str) -> Self {
		Self {
			name: Box::from(name),
			snap: ArcSwap::from_pointee(Table::default()),
			listeners: Mutex::new(Vec::new()),
			next_subscription: AtomicU64::new(0),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Adds `value` under `key`, failing if the key is taken.
	pub fn add<T>(&self, key: impl Into<Box<str>>, value: T) -> Result<(), RegistryError>
	where
		T: Any + Send + Sync,
	{
		self.add_with(key, value, AddOptions::default())
	}

	/// Adds `value` under `key`. With [`AddOptions::force`] an existing key is overwritten.
	pub fn add_with<T>(&self, key: impl Into<Box<str>>, value: T, options: AddOptions) -> Result<(), RegistryError>
	where
		T: Any + Send + Sync,
	{
		let key = key.into();
		let slot = Slot {
			value: Arc::new(value),
			type_name: type_name::<T>(),
		};

		let replaced = loop {
			let old = self.snap.load_full();
			let exists = old.contains_key(&key);
			if exists && !options.force {
				return Err(RegistryConflictError {
					category: self.name.clone(),
					key,
				}
				.into());
			}

			let mut next = (*old).clone();
			next.insert(key.clone(), slot.clone());

			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				break exists;
			}
			// CAS failed, retry with updated snapshot
		};

		let operation = if replaced { Operation::Replaced } else { Operation::Added };
		debug!(category = %self.name, %key, ?operation, ty = slot.type_name, "registry add");
		self.emit(key, operation);
		Ok(())
	}

	/// Returns the value under `key` as a `T`.
	pub fn get<T>(&self, key: &str) -> Result<Arc<T>, RegistryError>
	where
		T: Any + Send + Sync,
	{
		let snap = self.snap.load();
		let Some(slot) = snap.get(key) else {
			return Err(RegistryNotFoundError {
				category: self.name.clone(),
				key: Box::from(key),
			}
			.into());
		};
		self.downcast(key, slot)
	}

	/// Returns the value under `key`, or `default` if the key is absent.
	///
	/// A present value of another type is still an error.
	pub fn get_or<T>(&self, key: &str, default: T) -> Result<Arc<T>, RegistryError>
	where
		T: Any + Send + Sync,
	{
		let snap = self.snap.load();
		match snap.get(key) {
			Some(slot) => self.downcast(key, slot),
			None => Ok(Arc::new(default)),
		}
	}

	/// Returns the untyped value under `key`.
	pub fn get_value(&self, key: &str) -> Option<Value> {
		self.snap.load().get(key).map(|slot| Arc::clone(&slot.value))
	}

	pub fn contains(&self, key: &str) -> bool {
		self.snap.load().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> Vec<Box<str>> {
		self.snap.load().keys().cloned().collect()
	}

	/// Entries holding a `T`, in insertion order. Values of other types are skipped.
	pub fn entries<T>(&self) -> Vec<(Box<str>, Arc<T>)>
	where
		T: Any + Send + Sync,
	{
		self.snap
			.load()
			.iter()
			.filter_map(|(key, slot)| {
				let value = Arc::clone(&slot.value).downcast::<T>().ok()?;
				Some((key.clone(), value))
			})
			.collect()
	}

	/// Removes `key`. Returns false if it was absent, which is not an error.
	pub fn remove(&self, key: &str) -> bool {
		loop {
			let old = self.snap.load_full();
			if !old.contains_key(key) {
				return false;
			}

			let mut next = (*old).clone();
			next.shift_remove(key);

			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				break;
			}
		}

		debug!(category = %self.name, key, "registry remove");
		self.emit(Box::from(key), Operation::Removed);
		true
	}

	/// Registers `listener` for every later change in this category.
	///
	/// Listeners run on the writing thread after the change is published and outside every
	/// lock. Events from one thread arrive in that thread's order. Events from concurrent
	/// writers may arrive in a different order than the changes were published; read the
	/// category back from the listener when the current value matters.
	pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
	where
		F: Fn(&RegistryEvent) + Send + Sync + 'static,
	{
		let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
		self.listeners.lock().push((id, Arc::new(listener)));
		id
	}

	/// Drops a subscription. Returns false if it was already gone.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut listeners = self.listeners.lock();
		let before = listeners.len();
		listeners.retain(|(existing, _)| *existing != id);
		listeners.len() != before
	}

	fn downcast<T>(&self, key: &str, slot: &Slot) -> Result<Arc<T>, RegistryError>
	where
		T: Any + Send + Sync,
	{
		Arc::clone(&slot.value).downcast::<T>().map_err(|_| {
			RegistryTypeError {
				category: self.name.clone(),
				key: Box::from(key),
				expected: type_name::<T>(),
				found: slot.type_name,
			}
			.into()
		})
	}

	fn emit(&self, key: Box<str>, operation: Operation) {
		// Listeners may call back into this category.
		let listeners: Vec<Listener> = self.listeners.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
		if listeners.is_empty() {
			return;
		}

		let event = RegistryEvent {
			category: self.name.clone(),
			key,
			operation,
		};
		for listener in listeners {
			listener(&event);
		}
	}
}
