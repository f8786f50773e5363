use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub store: Store,
	pub collections: Collections,
	pub providers: Providers,
	pub search: Search,
	pub categories: Categories,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Overall deadline applied by callers to a single operation.
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Store {
	pub url: String,
	pub api_key: String,
	pub timeout_ms: u64,
	/// Backend-imposed ceiling on `per_page`.
	#[serde(default = "default_max_page_size")]
	pub max_page_size: u32,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Collections {
	/// Canonical collection of published records. Redirections resolve into it.
	pub records: String,
	pub versions: String,
	pub overlay: String,
	pub aggregated: String,
	/// Frozen collections whose documents may be decommissioned by an overlay entry.
	#[serde(default)]
	pub legacy: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: Option<EmbeddingProviderConfig>,
	pub relevance: RelevanceProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub max_input_chars: usize,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RelevanceProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub query_by: Vec<String>,
	#[serde(default)]
	pub include_fields: Vec<String>,
	#[serde(default = "default_exclude_fields")]
	pub exclude_fields: Vec<String>,
	/// Weight of the vector side in hybrid queries. 0.0 is text only, 1.0 is vector only.
	pub blend_alpha: f32,
	#[serde(default = "default_vector_precision")]
	pub vector_precision: usize,
	#[serde(default = "default_published_status")]
	pub published_status: String,
	#[serde(default = "default_max_facet_values")]
	pub max_facet_values: u32,
}

#[derive(Debug, Deserialize)]
pub struct Categories {
	#[serde(default = "default_category_field")]
	pub field: String,
	#[serde(default = "default_title_field")]
	pub title_field: String,
	pub canonical: Vec<String>,
}

fn default_request_timeout_ms() -> u64 {
	30_000
}

fn default_max_page_size() -> u32 {
	250
}

fn default_exclude_fields() -> Vec<String> {
	vec!["embedding".to_string()]
}

fn default_vector_precision() -> usize {
	6
}

fn default_published_status() -> String {
	"published".to_string()
}

fn default_max_facet_values() -> u32 {
	250
}

fn default_category_field() -> String {
	"category".to_string()
}

fn default_title_field() -> String {
	"title".to_string()
}
