use serde::{Deserialize, Serialize};

use mosaic_domain::{DocumentRef, LogicalDocument};

use crate::{Error, MosaicService, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedDocument {
	/// Collection the document was actually read from.
	pub collection: String,
	pub document: LogicalDocument,
	/// Set when the requested legacy document was decommissioned and its replacement returned.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirected_from: Option<DocumentRef>,
}

impl MosaicService {
	/// Reads one document. A decommissioned legacy document resolves to its replacement in the
	/// records collection, one hop only.
	pub async fn get_by_id(&self, collection: &str, id: &str) -> Result<FetchedDocument> {
		if collection.trim().is_empty() {
			return Err(Error::invalid("collection must be non-empty."));
		}
		if id.trim().is_empty() {
			return Err(Error::invalid("id must be non-empty."));
		}

		if let Some(entry) = self.overlay().redirect_for(collection, id).await? {
			let canonical = self.cfg.collections.records.as_str();

			tracing::info!(
				collection,
				document_id = id,
				replacement_id = %entry.replacement_id,
				"Following redirection."
			);

			let document = self.fetch_document(canonical, &entry.replacement_id).await?;

			return Ok(FetchedDocument {
				collection: canonical.to_string(),
				document,
				redirected_from: Some(entry.legacy_ref()),
			});
		}

		let document = self.fetch_document(collection, id).await?;

		Ok(FetchedDocument { collection: collection.to_string(), document, redirected_from: None })
	}

	async fn fetch_document(&self, collection: &str, id: &str) -> Result<LogicalDocument> {
		let fields = self.store.get_document(collection, id).await?;

		LogicalDocument::from_fields(fields).map_err(|err| Error::Upstream {
			message: format!("Document {collection}/{id} could not be decoded: {err}."),
		})
	}
}
