use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document. Fields every collection shares are typed; everything else is kept in
/// `extra` in the order the store returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalDocument {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl LogicalDocument {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), title: None, status: None, extra: Map::new() }
	}

	pub fn from_fields(fields: Map<String, Value>) -> serde_json::Result<Self> {
		serde_json::from_value(Value::Object(fields))
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());

		self
	}

	pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
		let name = name.into();

		match name.as_str() {
			"id" => self.id = value_to_string(value),
			"title" => self.title = Some(value_to_string(value)),
			"status" => self.status = Some(value_to_string(value)),
			_ => {
				self.extra.insert(name, value);
			},
		}

		self
	}

	/// Looks a field up by name across the typed fields and the extra bucket.
	pub fn field(&self, name: &str) -> Option<Value> {
		match name {
			"id" => Some(Value::String(self.id.clone())),
			"title" => self.title.clone().map(Value::String),
			"status" => self.status.clone().map(Value::String),
			_ => self.extra.get(name).cloned(),
		}
	}

	pub fn str_field(&self, name: &str) -> Option<&str> {
		match name {
			"id" => Some(self.id.as_str()),
			"title" => self.title.as_deref(),
			"status" => self.status.as_deref(),
			_ => self.extra.get(name).and_then(Value::as_str),
		}
	}
}

fn value_to_string(value: Value) -> String {
	match value {
		Value::String(text) => text,
		other => other.to_string(),
	}
}

/// Identity of a document across collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
	pub collection: String,
	pub id: String,
}
impl DocumentRef {
	pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
		Self { collection: collection.into(), id: id.into() }
	}
}
impl fmt::Display for DocumentRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.collection, self.id)
	}
}
