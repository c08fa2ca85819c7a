use tracing::warn;

use crate::error::PatchError;
use crate::target::PatchHandle;

/// Reverts its layer when dropped.
///
/// Guards created in sequence and dropped in reverse declaration order unwind their layers
/// in the required order. A revert failure during drop is logged and otherwise ignored; call
/// [`PatchGuard::revert`] to observe it.
#[must_use = "dropping the guard reverts the layer immediately"]
pub struct PatchGuard<M> {
	handle: Option<PatchHandle<M>>,
	armed: bool,
}

impl<M> PatchGuard<M> {
	pub(crate) fn new(handle: PatchHandle<M>) -> Self {
		Self {
			handle: Some(handle),
			armed: true,
		}
	}

	/// The handle of the guarded layer, while the guard still owns an active layer.
	pub fn handle(&self) -> Option<&PatchHandle<M>> {
		self.handle.as_ref().filter(|_| self.armed)
	}

	/// Reverts now and reports the outcome.
	///
	/// On failure the guard stays armed and retries on drop. Once the layer is reverted, later
	/// calls fail with [`crate::PatchStateError::AlreadyReverted`] like any other handle.
	pub fn revert(&mut self) -> Result<(), PatchError> {
		let Some(handle) = self.handle.as_ref() else {
			return Ok(());
		};
		handle.revert()?;
		self.armed = false;
		Ok(())
	}

	/// Disarms the guard, leaving the layer installed.
	pub fn into_handle(mut self) -> Option<PatchHandle<M>> {
		let armed = std::mem::replace(&mut self.armed, false);
		self.handle.take().filter(|_| armed)
	}
}

impl<M> Drop for PatchGuard<M> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		let Some(handle) = self.handle.take() else {
			return;
		};
		if let Err(error) = handle.revert() {
			warn!(target_label = handle.target_label(), layer = %handle.layer(), %error, "scoped patch failed to revert");
		}
	}
}
