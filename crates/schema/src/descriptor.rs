use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open mapping of field properties (`type`, `default`, `string`, `relation`, ...).
///
/// Descriptors are replaced whole when merged, never combined key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDescriptor(Map<String, Value>);

impl FieldDescriptor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the descriptor with `key` set to `value`.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// The `default` property.
	pub fn default_value(&self) -> Option<&Value> {
		self.get("default")
	}

	/// The `type` property, when it is a string.
	pub fn field_type(&self) -> Option<&str> {
		self.get("type").and_then(Value::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Map<String, Value>> for FieldDescriptor {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldDescriptor {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
