/// A key was added twice without forcing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key `{key}` is already registered in category `{category}`")]
pub struct RegistryConflictError {
	pub category: Box<str>,
	pub key: Box<str>,
}

/// A key was looked up without a default and is absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key `{key}` not found in category `{category}`")]
pub struct RegistryNotFoundError {
	pub category: Box<str>,
	pub key: Box<str>,
}

/// The stored value is not of the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key `{key}` in category `{category}` holds `{found}`, not `{expected}`")]
pub struct RegistryTypeError {
	pub category: Box<str>,
	pub key: Box<str>,
	pub expected: &'static str,
	pub found: &'static str,
}

/// Generic registry error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error(transparent)]
	Conflict(#[from] RegistryConflictError),
	#[error(transparent)]
	NotFound(#[from] RegistryNotFoundError),
	#[error(transparent)]
	Type(#[from] RegistryTypeError),
}
