mod store;

pub use store::{FakeStore, StoreCall};

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Map;
use time::OffsetDateTime;

use mosaic_config::{
	Categories, Collections, Config, EmbeddingProviderConfig, Providers as ProviderConfigs,
	RelevanceProviderConfig, Search, Service, Store,
};
use mosaic_domain::RedirectionEntry;
use mosaic_providers::Error as ProviderError;
use mosaic_service::{
	BoxFuture, EmbeddingProvider, MosaicService, Providers, RedirectionIndex, RelevanceSource,
	Result,
};

pub const RECORDS: &str = "records";
pub const OVERLAY: &str = "decommissioned";
pub const LEGACY: &str = "legacy_records";
pub const VECTOR_DIM: u32 = 4;

/// Configuration for service tests: small vectors, one legacy collection, and three canonical
/// categories.
pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "debug".to_string(), request_timeout_ms: 5_000 },
		store: Store {
			url: "http://store.invalid".to_string(),
			api_key: "test".to_string(),
			timeout_ms: 1_000,
			max_page_size: mosaic_config::MAX_PAGE_SIZE_CEILING,
			vector_dim: VECTOR_DIM,
		},
		collections: Collections {
			records: RECORDS.to_string(),
			versions: "record_versions".to_string(),
			overlay: OVERLAY.to_string(),
			aggregated: "aggregated".to_string(),
			legacy: vec![LEGACY.to_string()],
		},
		providers: ProviderConfigs {
			embedding: Some(EmbeddingProviderConfig {
				api_base: "http://embed.invalid".to_string(),
				api_key: "test".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: VECTOR_DIM,
				max_input_chars: 32,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			}),
			relevance: RelevanceProviderConfig {
				api_base: "http://relevance.invalid".to_string(),
				api_key: None,
				path: "/relevance".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		search: Search {
			query_by: vec!["title".to_string(), "body".to_string()],
			include_fields: Vec::new(),
			exclude_fields: vec!["embedding".to_string()],
			blend_alpha: 0.3,
			vector_precision: 6,
			published_status: "published".to_string(),
			max_facet_values: 250,
		},
		categories: Categories {
			field: "category".to_string(),
			title_field: "title".to_string(),
			canonical: vec![
				"Arquitetura".to_string(),
				"Música".to_string(),
				"Patrimônio Imaterial".to_string(),
			],
		},
	}
}

/// Embedding provider returning one fixed vector, or failing on every call.
#[derive(Debug)]
pub struct FakeEmbedding {
	vector: Option<Vec<f32>>,
	inputs: Mutex<Vec<String>>,
}
impl FakeEmbedding {
	pub fn returning(vector: Vec<f32>) -> Self {
		Self { vector: Some(vector), inputs: Mutex::new(Vec::new()) }
	}

	pub fn failing() -> Self {
		Self { vector: None, inputs: Mutex::new(Vec::new()) }
	}

	/// Texts the provider was asked to embed, in call order.
	pub fn inputs(&self) -> Vec<String> {
		lock(&self.inputs).clone()
	}
}
impl EmbeddingProvider for FakeEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<Vec<f32>>> {
		Box::pin(async move {
			lock(&self.inputs).push(text.to_string());

			self.vector.clone().ok_or_else(|| ProviderError::InvalidResponse {
				message: "Injected embedding failure.".to_string(),
			})
		})
	}
}

/// Relevance source scoring titles from a fixed table. Unknown titles score 0.
#[derive(Debug, Default)]
pub struct FakeRelevance {
	scores: HashMap<String, i64>,
	failing: Vec<String>,
	titles: Mutex<Vec<String>>,
}
impl FakeRelevance {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_score(mut self, title: &str, score: i64) -> Self {
		self.scores.insert(title.to_string(), score);

		self
	}

	pub fn with_failing_title(mut self, title: &str) -> Self {
		self.failing.push(title.to_string());

		self
	}

	pub fn titles(&self) -> Vec<String> {
		lock(&self.titles).clone()
	}
}
impl RelevanceSource for FakeRelevance {
	fn score_by_title<'a>(
		&'a self,
		_cfg: &'a RelevanceProviderConfig,
		title: &'a str,
	) -> BoxFuture<'a, mosaic_providers::Result<i64>> {
		Box::pin(async move {
			lock(&self.titles).push(title.to_string());

			if self.failing.iter().any(|failing| failing == title) {
				return Err(ProviderError::InvalidResponse {
					message: format!("Injected relevance failure for {title:?}."),
				});
			}

			Ok(self.scores.get(title).copied().unwrap_or(0))
		})
	}
}

/// Redirection index over an in-memory table.
#[derive(Debug, Default)]
pub struct FakeRedirects {
	entries: HashMap<(String, String), RedirectionEntry>,
	failing: bool,
	lookups: Mutex<Vec<(String, String)>>,
}
impl FakeRedirects {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_redirect(
		mut self,
		legacy_collection: &str,
		legacy_id: &str,
		replacement_id: &str,
	) -> Self {
		let entry = redirection_entry(legacy_collection, legacy_id, replacement_id);

		self.entries.insert((legacy_collection.to_string(), legacy_id.to_string()), entry);

		self
	}

	/// Every lookup fails.
	pub fn failing() -> Self {
		Self { failing: true, ..Self::default() }
	}

	pub fn lookups(&self) -> Vec<(String, String)> {
		lock(&self.lookups).clone()
	}
}
impl RedirectionIndex for FakeRedirects {
	fn lookup<'a>(
		&'a self,
		legacy_collection: &'a str,
		legacy_id: &'a str,
	) -> BoxFuture<'a, Result<Option<RedirectionEntry>>> {
		Box::pin(async move {
			lock(&self.lookups).push((legacy_collection.to_string(), legacy_id.to_string()));

			if self.failing {
				return Err(mosaic_service::Error::Upstream {
					message: "Injected redirection failure.".to_string(),
				});
			}

			Ok(self.entries.get(&(legacy_collection.to_string(), legacy_id.to_string())).cloned())
		})
	}
}

pub fn redirection_entry(
	legacy_collection: &str,
	legacy_id: &str,
	replacement_id: &str,
) -> RedirectionEntry {
	RedirectionEntry {
		legacy_collection: legacy_collection.to_string(),
		legacy_id: legacy_id.to_string(),
		replacement_id: replacement_id.to_string(),
		created_at: OffsetDateTime::UNIX_EPOCH,
		created_by: "testkit".to_string(),
		notes: None,
	}
}

/// Collaborators of one test service, kept so tests can inspect what was called.
pub struct Harness {
	pub service: MosaicService,
	pub store: Arc<FakeStore>,
	pub redirects: Arc<FakeRedirects>,
	pub embedding: Arc<FakeEmbedding>,
	pub relevance: Arc<FakeRelevance>,
}
impl Harness {
	pub fn new(store: FakeStore) -> Self {
		Self::builder(store).build()
	}

	pub fn builder(store: FakeStore) -> HarnessBuilder {
		HarnessBuilder {
			cfg: test_config(),
			store,
			redirects: FakeRedirects::new(),
			embedding: FakeEmbedding::returning(vec![0.5; VECTOR_DIM as usize]),
			relevance: FakeRelevance::new(),
		}
	}
}

pub struct HarnessBuilder {
	cfg: Config,
	store: FakeStore,
	redirects: FakeRedirects,
	embedding: FakeEmbedding,
	relevance: FakeRelevance,
}
impl HarnessBuilder {
	pub fn config(mut self, f: impl FnOnce(&mut Config)) -> Self {
		f(&mut self.cfg);

		self
	}

	pub fn redirects(mut self, redirects: FakeRedirects) -> Self {
		self.redirects = redirects;

		self
	}

	pub fn embedding(mut self, embedding: FakeEmbedding) -> Self {
		self.embedding = embedding;

		self
	}

	pub fn relevance(mut self, relevance: FakeRelevance) -> Self {
		self.relevance = relevance;

		self
	}

	pub fn build(self) -> Harness {
		let store = Arc::new(self.store);
		let redirects = Arc::new(self.redirects);
		let embedding = Arc::new(self.embedding);
		let relevance = Arc::new(self.relevance);
		let service = MosaicService::with_parts(
			self.cfg,
			store.clone(),
			redirects.clone(),
			Providers::new(embedding.clone(), relevance.clone()),
		);

		Harness { service, store, redirects, embedding, relevance }
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
