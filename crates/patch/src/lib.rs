//! Layered behavior overlays on shared method tables.
//!
//! # Mental Model
//!
//! A [`Target`] is a process-wide method table: name → implementation of type `M`. An
//! [`Overlay`] is a set of replacements applied atomically on top of it. Each replacement is
//! built by a factory that receives the implementation the name resolved to immediately
//! before the overlay was applied (the call-through). The factory closes over that value, so
//! the binding is fixed at apply time and never re-resolved at call time.
//!
//! Layers stack per name. The most recently applied layer resolves first and delegates down
//! toward the original through its captured call-through.
//!
//! # Invariants
//!
//! - Apply is all-or-nothing: every override is validated before any factory runs.
//!   - Enforced in: [`Target::apply`].
//!   - Failure symptom: a failed apply leaves half an overlay installed.
//!
//! - Per name, layers revert in strict reverse application order.
//!   - Enforced in: [`Target::revert`].
//!   - Failure symptom: a still-active layer calls through into a removed implementation.
//!
//! - A handle reverts at most once.
//!   - Enforced in: [`Target::revert`] (layer must still be listed as active).
//!
//! # Concurrency
//!
//! The table sits behind a `parking_lot::RwLock`. Apply captures call-throughs under a short
//! read lock, runs factories with no lock held, then publishes under the write lock after
//! checking that no touched name gained or lost a layer in between. Factory code may call back
//! into its own target.

mod error;
mod guard;
mod overlay;
mod target;

pub use error::{PatchError, PatchStateError, PatchTargetError};
pub use guard::PatchGuard;
pub use overlay::Overlay;
pub use target::{LayerId, LayerInfo, PatchHandle, Target};

/// Applies `overlay` to `target`.
///
/// Shorthand for [`Target::apply`].
pub fn apply<M: Clone>(target: &Target<M>, overlay: Overlay<M>) -> Result<PatchHandle<M>, PatchError> {
	target.apply(overlay)
}

/// Reverts the layer referenced by `handle` on the target it was applied to.
pub fn revert<M>(handle: &PatchHandle<M>) -> Result<(), PatchError> {
	handle.revert()
}
