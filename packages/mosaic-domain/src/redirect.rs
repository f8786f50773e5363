use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::DocumentRef;

/// Marks a legacy document as superseded by a document in the canonical collection.
///
/// At most one entry exists per `(legacy_collection, legacy_id)`. Redirection is a single hop:
/// `replacement_id` always names a canonical document and is never looked up again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectionEntry {
	pub legacy_collection: String,
	pub legacy_id: String,
	pub replacement_id: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub created_by: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}
impl RedirectionEntry {
	pub fn legacy_ref(&self) -> DocumentRef {
		DocumentRef::new(self.legacy_collection.clone(), self.legacy_id.clone())
	}
}
