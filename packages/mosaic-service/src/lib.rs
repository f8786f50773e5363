pub mod category;
pub mod document;
pub mod overlay;
pub mod schema;
pub mod search;

mod error;

pub use category::{CategoryRelevance, CategorySearchRequest};
pub use document::FetchedDocument;
pub use error::{Error, Result};
pub use overlay::{OverlayFilter, StoreRedirectionIndex};
pub use schema::EnsureOutcome;
pub use search::{MergedResult, SearchHit, SearchRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use mosaic_config::{Config, EmbeddingProviderConfig, RelevanceProviderConfig};
use mosaic_domain::RedirectionEntry;
use mosaic_providers::{embedding, relevance};
use mosaic_storage::{
	models::{SearchQuery, SearchResult},
	schema::CollectionSchema,
	typesense::TypesenseStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backing document store. Implementations own scoring; this crate only orders and filters.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	/// One outcome per query, in submission order.
	fn multi_search<'a>(
		&'a self,
		queries: &'a [SearchQuery],
	) -> BoxFuture<'a, mosaic_storage::Result<Vec<mosaic_storage::Result<SearchResult>>>>;

	fn search<'a>(
		&'a self,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, mosaic_storage::Result<SearchResult>>;

	fn get_document<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
	) -> BoxFuture<'a, mosaic_storage::Result<Map<String, Value>>>;

	fn retrieve_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, mosaic_storage::Result<Value>>;

	fn create_collection<'a>(
		&'a self,
		schema: &'a CollectionSchema,
	) -> BoxFuture<'a, mosaic_storage::Result<()>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<Vec<f32>>>;
}

pub trait RelevanceSource
where
	Self: Send + Sync,
{
	fn score_by_title<'a>(
		&'a self,
		cfg: &'a RelevanceProviderConfig,
		title: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<i64>>;
}

/// Read-only view of the decommissioning overlay.
pub trait RedirectionIndex
where
	Self: Send + Sync,
{
	fn lookup<'a>(
		&'a self,
		legacy_collection: &'a str,
		legacy_id: &'a str,
	) -> BoxFuture<'a, Result<Option<RedirectionEntry>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub relevance: Arc<dyn RelevanceSource>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		relevance: Arc<dyn RelevanceSource>,
	) -> Self {
		Self { embedding, relevance }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), relevance: provider }
	}
}

/// Request-scoped search engine. Holds no mutable state; every collaborator is read-only.
pub struct MosaicService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	pub redirects: Arc<dyn RedirectionIndex>,
	pub providers: Providers,
}
impl MosaicService {
	/// Wires the HTTP store, the overlay-backed redirection index, and the HTTP providers.
	pub fn new(cfg: Config) -> Result<Self> {
		let store: Arc<dyn DocumentStore> = Arc::new(TypesenseStore::new(&cfg.store)?);
		let redirects =
			Arc::new(StoreRedirectionIndex::new(store.clone(), cfg.collections.overlay.clone()));

		Ok(Self { cfg, store, redirects, providers: Providers::default() })
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn DocumentStore>,
		redirects: Arc<dyn RedirectionIndex>,
		providers: Providers,
	) -> Self {
		Self { cfg, store, redirects, providers }
	}

	pub(crate) fn overlay(&self) -> OverlayFilter<'_> {
		OverlayFilter::new(&self.cfg.collections.legacy, self.redirects.as_ref())
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl RelevanceSource for DefaultProviders {
	fn score_by_title<'a>(
		&'a self,
		cfg: &'a RelevanceProviderConfig,
		title: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<i64>> {
		Box::pin(relevance::score_by_title(cfg, title))
	}
}

impl DocumentStore for TypesenseStore {
	fn multi_search<'a>(
		&'a self,
		queries: &'a [SearchQuery],
	) -> BoxFuture<'a, mosaic_storage::Result<Vec<mosaic_storage::Result<SearchResult>>>> {
		Box::pin(TypesenseStore::multi_search(self, queries))
	}

	fn search<'a>(
		&'a self,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, mosaic_storage::Result<SearchResult>> {
		Box::pin(TypesenseStore::search(self, query))
	}

	fn get_document<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
	) -> BoxFuture<'a, mosaic_storage::Result<Map<String, Value>>> {
		Box::pin(TypesenseStore::get_document(self, collection, id))
	}

	fn retrieve_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, mosaic_storage::Result<Value>> {
		Box::pin(TypesenseStore::retrieve_collection(self, name))
	}

	fn create_collection<'a>(
		&'a self,
		schema: &'a CollectionSchema,
	) -> BoxFuture<'a, mosaic_storage::Result<()>> {
		Box::pin(TypesenseStore::create_collection(self, schema))
	}
}
