use mosaic_storage::schema::{CollectionKind, CollectionSchema, SchemaLayout, declared_schema};

use crate::{DocumentStore, Error, MosaicService, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
	Existing,
	Created,
	/// Another caller created the collection between our lookup and our create.
	CreatedConcurrently,
}

/// Makes sure `schema.name` exists, creating it from `schema` when the store reports it missing.
///
/// Safe to call concurrently: losing the creation race is reported as
/// [`EnsureOutcome::CreatedConcurrently`], never as an error.
pub async fn ensure_collection(
	store: &dyn DocumentStore,
	schema: &CollectionSchema,
) -> Result<EnsureOutcome> {
	match store.retrieve_collection(&schema.name).await {
		Ok(_) => return Ok(EnsureOutcome::Existing),
		Err(err) if err.is_not_found() => {},
		Err(err) => return Err(err.into()),
	}

	match store.create_collection(schema).await {
		Ok(()) => {
			tracing::info!(
				collection = %schema.name,
				fields = schema.fields.len(),
				"Collection created."
			);

			Ok(EnsureOutcome::Created)
		},
		Err(err) if err.is_already_exists() => {
			tracing::info!(collection = %schema.name, "Collection was created concurrently.");

			Ok(EnsureOutcome::CreatedConcurrently)
		},
		Err(err) => Err(err.into()),
	}
}

impl MosaicService {
	/// Ensures one of the configured collections exists with its declared schema.
	pub async fn ensure_collection_exists(&self, name: &str) -> Result<EnsureOutcome> {
		let layout = SchemaLayout::from_config(&self.cfg);
		let schema = declared_schema(&self.cfg.collections, name, &layout).ok_or_else(|| {
			Error::invalid(format!("No schema is declared for collection {name:?}."))
		})?;

		ensure_collection(self.store.as_ref(), &schema).await
	}

	pub async fn ensure_all_collections(&self) -> Result<Vec<(String, EnsureOutcome)>> {
		let layout = SchemaLayout::from_config(&self.cfg);
		let mut out = Vec::with_capacity(CollectionKind::ALL.len());

		for kind in CollectionKind::ALL {
			let name = kind.configured_name(&self.cfg.collections);
			let schema = kind.schema(name, &layout);
			let outcome = ensure_collection(self.store.as_ref(), &schema).await?;

			out.push((name.to_string(), outcome));
		}

		Ok(out)
	}
}
