use crate::target::LayerId;

/// An overlay tried to override a name the target does not define.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot override `{name}` on target `{target}`: no prior definition")]
pub struct PatchTargetError {
	/// Label of the target.
	pub target: Box<str>,
	/// The missing name.
	pub name: Box<str>,
}

/// An apply or revert was requested in a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchStateError {
	/// The layer is no longer active on the target.
	#[error("{layer} on target `{target}` was already reverted")]
	AlreadyReverted {
		/// Label of the target.
		target: Box<str>,
		/// The reverted layer.
		layer: LayerId,
	},
	/// A newer active layer still overrides a name this layer touched.
	#[error("cannot revert {layer} on target `{target}`: `{name}` is still overridden by {blocking}")]
	OutOfOrder {
		/// Label of the target.
		target: Box<str>,
		/// The overlapping name.
		name: Box<str>,
		/// The layer that was asked to revert.
		layer: LayerId,
		/// The newer layer that must be reverted first.
		blocking: LayerId,
	},
	/// The handle was issued by a different target.
	#[error("{layer} belongs to target `{owner}`, not `{target}`")]
	ForeignTarget {
		/// Label of the target asked to revert.
		target: Box<str>,
		/// Label of the target that issued the handle.
		owner: Box<str>,
		/// The layer referenced by the handle.
		layer: LayerId,
	},
	/// Another apply or revert changed a name while this overlay's factories ran.
	#[error("cannot apply overlay to target `{target}`: `{name}` changed while its replacement was built")]
	Interleaved {
		/// Label of the target.
		target: Box<str>,
		/// The name whose call-through went stale.
		name: Box<str>,
	},
}

/// Errors returned by apply and revert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
	#[error(transparent)]
	Target(#[from] PatchTargetError),
	#[error(transparent)]
	State(#[from] PatchStateError),
}
