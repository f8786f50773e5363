use std::sync::Arc;

use serde_json::Value;

use mosaic_domain::RedirectionEntry;
use mosaic_storage::{models::SearchQuery, schema::VECTOR_FIELD};

use crate::{
	BoxFuture, DocumentStore, Error, RedirectionIndex, Result,
	search::{
		merge::{ScoredHit, SearchHit},
		planner::{and_filters, exact_filter},
	},
};

/// Where a hit lives, as far as the overlay is concerned.
pub trait OverlayKey {
	fn source_collection(&self) -> &str;

	fn document_id(&self) -> &str;
}
impl OverlayKey for SearchHit {
	fn source_collection(&self) -> &str {
		&self.source_collection
	}

	fn document_id(&self) -> &str {
		&self.document.id
	}
}
impl OverlayKey for ScoredHit {
	fn source_collection(&self) -> &str {
		&self.source_collection
	}

	fn document_id(&self) -> &str {
		&self.document.id
	}
}

/// Applies the decommissioning overlay to hits from the configured legacy collections.
pub struct OverlayFilter<'a> {
	legacy: &'a [String],
	index: &'a dyn RedirectionIndex,
}
impl<'a> OverlayFilter<'a> {
	pub fn new(legacy: &'a [String], index: &'a dyn RedirectionIndex) -> Self {
		Self { legacy, index }
	}

	/// Only legacy collections are ever looked up.
	pub fn is_checked(&self, collection: &str) -> bool {
		self.legacy.iter().any(|name| name == collection)
	}

	pub async fn redirect_for(
		&self,
		collection: &str,
		id: &str,
	) -> Result<Option<RedirectionEntry>> {
		if !self.is_checked(collection) {
			return Ok(None);
		}

		self.index.lookup(collection, id).await
	}

	/// Drops every hit that has a redirection entry. A failed lookup keeps the hit.
	pub async fn retain_live<H>(&self, hits: Vec<H>) -> Vec<H>
	where
		H: OverlayKey,
	{
		let mut out = Vec::with_capacity(hits.len());

		for hit in hits {
			match self.redirect_for(hit.source_collection(), hit.document_id()).await {
				Ok(None) => out.push(hit),
				Ok(Some(entry)) => {
					tracing::debug!(
						collection = %entry.legacy_collection,
						document_id = %entry.legacy_id,
						replacement_id = %entry.replacement_id,
						"Dropping decommissioned hit."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						collection = hit.source_collection(),
						document_id = hit.document_id(),
						"Redirection lookup failed. Keeping hit."
					);

					out.push(hit);
				},
			}
		}

		out
	}
}

/// Redirection index read from the overlay collection of the document store.
pub struct StoreRedirectionIndex {
	store: Arc<dyn DocumentStore>,
	collection: String,
}
impl StoreRedirectionIndex {
	pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
		Self { store, collection: collection.into() }
	}

	async fn find(
		&self,
		legacy_collection: &str,
		legacy_id: &str,
	) -> Result<Option<RedirectionEntry>> {
		let filter_by = and_filters([
			exact_filter("legacy_collection", legacy_collection)?,
			exact_filter("legacy_id", legacy_id)?,
		]);
		let query = SearchQuery {
			filter_by,
			exclude_fields: vec![VECTOR_FIELD.to_string()],
			sort_by: Some("created_at:desc".to_string()),
			page: Some(1),
			per_page: Some(1),
			..SearchQuery::wildcard(self.collection.as_str())
		};
		let result = match self.store.search(&query).await {
			Ok(result) => result,
			Err(err) if err.is_not_found() => return Ok(None),
			Err(err) => return Err(err.into()),
		};
		let Some(hit) = result.hits.into_iter().next() else {
			return Ok(None);
		};
		let entry = serde_json::from_value(Value::Object(hit.document)).map_err(|err| {
			Error::Upstream {
				message: format!(
					"Malformed redirection entry for {legacy_collection}/{legacy_id}: {err}."
				),
			}
		})?;

		Ok(Some(entry))
	}
}
impl RedirectionIndex for StoreRedirectionIndex {
	fn lookup<'a>(
		&'a self,
		legacy_collection: &'a str,
		legacy_id: &'a str,
	) -> BoxFuture<'a, Result<Option<RedirectionEntry>>> {
		Box::pin(self.find(legacy_collection, legacy_id))
	}
}
