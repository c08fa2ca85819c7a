//! Shared method tables and the layer stacks installed on them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;

use crate::error::{PatchError, PatchStateError, PatchTargetError};
use crate::guard::PatchGuard;
use crate::overlay::{Entry, Overlay};

static NEXT_TARGET: AtomicU64 = AtomicU64::new(0);
static NEXT_LAYER: AtomicU64 = AtomicU64::new(0);

/// Process-unique identifier of an applied layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u64);

impl LayerId {
	fn next() -> Self {
		Self(NEXT_LAYER.fetch_add(1, Ordering::Relaxed))
	}

	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for LayerId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "layer#{}", self.0)
	}
}

/// Diagnostic view of an active layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
	pub id: LayerId,
	pub label: Option<Box<str>>,
	/// Names the layer overrides or adds, in overlay order.
	pub names: Vec<Box<str>>,
}

/// Original definition of a name plus the layers stacked on it, oldest first.
struct Slot<M> {
	base: Option<M>,
	stack: Vec<(LayerId, M)>,
}

impl<M> Slot<M> {
	fn effective(&self) -> Option<&M> {
		self.stack.last().map(|(_, m)| m).or(self.base.as_ref())
	}
}

struct MethodTable<M> {
	slots: HashMap<Box<str>, Slot<M>>,
	/// Active layers in application order.
	layers: Vec<LayerInfo>,
}

impl<M> MethodTable<M> {
	fn resolve(&self, name: &str) -> Option<&M> {
		self.slots.get(name).and_then(Slot::effective)
	}

	/// Newest layer stacked on `name`.
	fn top(&self, name: &str) -> Option<LayerId> {
		self.slots.get(name).and_then(|slot| slot.stack.last()).map(|(id, _)| *id)
	}
}

struct TargetInner<M> {
	id: u64,
	label: Box<str>,
	table: RwLock<MethodTable<M>>,
}

/// A shared method table that overlays can be layered onto.
///
/// Cloning yields another reference to the same table; every clone observes every layer.
pub struct Target<M> {
	inner: Arc<TargetInner<M>>,
}

impl<M> Clone for Target<M> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<M> std::fmt::Debug for Target<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let table = self.inner.table.read();
		f.debug_struct("Target")
			.field("label", &self.inner.label)
			.field("names", &table.slots.len())
			.field("layers", &table.layers.len())
			.finish()
	}
}

impl<M> Target<M> {
	/// Creates a target with no methods.
	pub fn empty(label: impl Into<Box<str>>) -> Self {
		Self::new(label, std::iter::empty::<(Box<str>, M)>())
	}

	/// Creates a target whose original table holds `methods`.
	pub fn new<I, K>(label: impl Into<Box<str>>, methods: I) -> Self
	where
		I: IntoIterator<Item = (K, M)>,
		K: Into<Box<str>>,
	{
		let slots = methods
			.into_iter()
			.map(|(name, m)| {
				(
					name.into(),
					Slot {
						base: Some(m),
						stack: Vec::new(),
					},
				)
			})
			.collect();

		Self {
			inner: Arc::new(TargetInner {
				id: NEXT_TARGET.fetch_add(1, Ordering::Relaxed),
				label: label.into(),
				table: RwLock::new(MethodTable {
					slots,
					layers: Vec::new(),
				}),
			}),
		}
	}

	pub fn label(&self) -> &str {
		&self.inner.label
	}

	/// Returns true if both references point at the same table.
	pub fn same_target(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.inner.table.read().resolve(name).is_some()
	}

	/// Returns every resolvable name, sorted.
	pub fn names(&self) -> Vec<Box<str>> {
		let table = self.inner.table.read();
		let mut names: Vec<Box<str>> = table
			.slots
			.iter()
			.filter(|(_, slot)| slot.effective().is_some())
			.map(|(name, _)| name.clone())
			.collect();
		names.sort_unstable();
		names
	}

	/// Number of active layers stacked on `name`.
	pub fn depth(&self, name: &str) -> usize {
		self.inner.table.read().slots.get(name).map_or(0, |slot| slot.stack.len())
	}

	/// Active layers in application order.
	pub fn active_layers(&self) -> Vec<LayerInfo> {
		self.inner.table.read().layers.clone()
	}

	/// Reverts the layer referenced by `handle`.
	///
	/// Fails without touching the table if the layer is already reverted, if a newer active
	/// layer still overrides one of its names, or if `handle` came from another target.
	pub fn revert(&self, handle: &PatchHandle<M>) -> Result<(), PatchError> {
		let layer = handle.layer;
		if !self.same_target(&handle.target) {
			return Err(PatchStateError::ForeignTarget {
				target: self.inner.label.clone(),
				owner: handle.target.inner.label.clone(),
				layer,
			}
			.into());
		}

		let popped = {
			let mut table = self.inner.table.write();
			let Some(pos) = table.layers.iter().position(|info| info.id == layer) else {
				return Err(PatchStateError::AlreadyReverted {
					target: self.inner.label.clone(),
					layer,
				}
				.into());
			};

			for name in &table.layers[pos].names {
				match table.top(name) {
					Some(id) if id == layer => {}
					Some(blocking) => {
						return Err(PatchStateError::OutOfOrder {
							target: self.inner.label.clone(),
							name: name.clone(),
							layer,
							blocking,
						}
						.into());
					}
					None => {
						return Err(PatchStateError::AlreadyReverted {
							target: self.inner.label.clone(),
							layer,
						}
						.into());
					}
				}
			}

			let info = table.layers.remove(pos);
			let mut popped = Vec::with_capacity(info.names.len());
			for name in &info.names {
				let emptied = match table.slots.get_mut(name) {
					Some(slot) => {
						popped.extend(slot.stack.pop());
						slot.base.is_none() && slot.stack.is_empty()
					}
					None => false,
				};
				if emptied {
					table.slots.remove(name);
				}
			}

			debug!(target_label = %self.inner.label, %layer, names = ?info.names, "reverted layer");
			popped
		};

		// Implementations may own arbitrary state; release them outside the lock.
		drop(popped);
		Ok(())
	}
}

impl<M: Clone> Target<M> {
	/// Returns the implementation `name` currently resolves to.
	pub fn resolve(&self, name: &str) -> Option<M> {
		self.inner.table.read().resolve(name).cloned()
	}

	/// Applies `overlay` as a new top layer.
	///
	/// Every override entry is checked before any factory runs. Factories run with no lock
	/// held, so they may resolve, apply or revert on this same target. If a name the overlay
	/// touches gained or lost a layer while the factories ran, the captured call-throughs are
	/// stale and the apply fails with [`PatchStateError::Interleaved`]. On error the table is
	/// left untouched.
	pub fn apply(&self, overlay: Overlay<M>) -> Result<PatchHandle<M>, PatchError> {
		let Overlay { label, entries } = overlay;

		let captured: Vec<(Option<M>, Option<LayerId>)> = {
			let table = self.inner.table.read();
			let mut captured = Vec::with_capacity(entries.len());
			for (name, entry) in &entries {
				let prev = table.resolve(name).cloned();
				if entry.requires_base() && prev.is_none() {
					return Err(PatchTargetError {
						target: self.inner.label.clone(),
						name: name.clone(),
					}
					.into());
				}
				captured.push((prev, table.top(name)));
			}
			captured
		};

		let mut built = Vec::with_capacity(entries.len());
		for ((name, entry), (prev, top)) in entries.into_iter().zip(captured) {
			let implementation = match (entry, prev) {
				(Entry::Override(build), Some(prev)) => build(prev),
				(Entry::Define(build), prev) => build(prev),
				(Entry::Override(_), None) => {
					return Err(PatchTargetError {
						target: self.inner.label.clone(),
						name,
					}
					.into());
				}
			};
			built.push((name, implementation, top));
		}

		let layer = LayerId::next();
		let mut table = self.inner.table.write();
		for (name, _, top) in &built {
			if table.top(name) != *top {
				return Err(PatchStateError::Interleaved {
					target: self.inner.label.clone(),
					name: name.clone(),
				}
				.into());
			}
		}

		let mut names = Vec::with_capacity(built.len());
		for (name, implementation, _) in built {
			table
				.slots
				.entry(name.clone())
				.or_insert_with(|| Slot {
					base: None,
					stack: Vec::new(),
				})
				.stack
				.push((layer, implementation));
			names.push(name);
		}

		debug!(target_label = %self.inner.label, %layer, ?label, ?names, "applied layer");
		table.layers.push(LayerInfo { id: layer, label, names });

		Ok(PatchHandle {
			target: self.clone(),
			layer,
		})
	}

	/// Applies `overlay` and reverts it when the returned guard drops.
	pub fn apply_scoped(&self, overlay: Overlay<M>) -> Result<PatchGuard<M>, PatchError> {
		self.apply(overlay).map(PatchGuard::new)
	}
}

/// Token for one applied layer on one target.
pub struct PatchHandle<M> {
	target: Target<M>,
	layer: LayerId,
}

impl<M> Clone for PatchHandle<M> {
	fn clone(&self) -> Self {
		Self {
			target: self.target.clone(),
			layer: self.layer,
		}
	}
}

impl<M> std::fmt::Debug for PatchHandle<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PatchHandle")
			.field("target", &self.target.inner.label)
			.field("layer", &self.layer)
			.finish()
	}
}

impl<M> PatchHandle<M> {
	pub fn layer(&self) -> LayerId {
		self.layer
	}

	/// Label of the target this handle was issued by.
	pub fn target_label(&self) -> &str {
		self.target.label()
	}

	/// Returns true while the layer is installed on `target`.
	pub fn is_active(&self, target: &Target<M>) -> bool {
		target.same_target(&self.target) && target.inner.table.read().layers.iter().any(|info| info.id == self.layer)
	}

	/// Reverts this layer on the target that issued it.
	pub fn revert(&self) -> Result<(), PatchError> {
		self.target.revert(self)
	}
}
