mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Categories, Collections, Config, EmbeddingProviderConfig, Providers, RelevanceProviderConfig,
	Search, Service, Store,
};

use std::{collections::HashSet, fs, path::Path};

/// Largest `per_page` the backing store accepts.
pub const MAX_PAGE_SIZE_CEILING: u32 = 250;

/// Field names the collection schemas declare on their own. The configured category and title
/// fields take the remaining slots.
pub const RESERVED_FIELDS: [&str; 16] = [
	"id",
	"status",
	"body",
	"summary",
	"slug",
	"tags",
	"created_at",
	"updated_at",
	"embedding",
	"source",
	"source_id",
	"featured",
	"record_id",
	"version",
	"changed_by",
	"changed_at",
];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.store.url.trim().is_empty() {
		return Err(Error::Validation { message: "store.url must be non-empty.".to_string() });
	}
	if cfg.store.api_key.trim().is_empty() {
		return Err(Error::Validation { message: "store.api_key must be non-empty.".to_string() });
	}
	if cfg.store.max_page_size == 0 || cfg.store.max_page_size > MAX_PAGE_SIZE_CEILING {
		return Err(Error::Validation {
			message: format!("store.max_page_size must be in the range 1-{MAX_PAGE_SIZE_CEILING}."),
		});
	}
	if cfg.store.vector_dim == 0 {
		return Err(Error::Validation {
			message: "store.vector_dim must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("collections.records", &cfg.collections.records),
		("collections.versions", &cfg.collections.versions),
		("collections.overlay", &cfg.collections.overlay),
		("collections.aggregated", &cfg.collections.aggregated),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.collections.legacy.iter().any(|name| name.trim().is_empty()) {
		return Err(Error::Validation {
			message: "collections.legacy must not contain empty names.".to_string(),
		});
	}
	if cfg.collections.legacy.iter().any(|name| name == &cfg.collections.records) {
		return Err(Error::Validation {
			message: "collections.legacy must not contain collections.records.".to_string(),
		});
	}

	if let Some(embedding) = cfg.providers.embedding.as_ref() {
		if embedding.dimensions == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.dimensions must be greater than zero.".to_string(),
			});
		}
		if embedding.dimensions != cfg.store.vector_dim {
			return Err(Error::Validation {
				message: "providers.embedding.dimensions must match store.vector_dim.".to_string(),
			});
		}
		if embedding.max_input_chars == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.max_input_chars must be greater than zero."
					.to_string(),
			});
		}
		if embedding.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "Provider embedding api_key must be non-empty.".to_string(),
			});
		}
	}

	if cfg.providers.relevance.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.relevance.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.search.query_by.is_empty() {
		return Err(Error::Validation {
			message: "search.query_by must be non-empty.".to_string(),
		});
	}
	if !cfg.search.blend_alpha.is_finite() {
		return Err(Error::Validation {
			message: "search.blend_alpha must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.blend_alpha) {
		return Err(Error::Validation {
			message: "search.blend_alpha must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(1..=10).contains(&cfg.search.vector_precision) {
		return Err(Error::Validation {
			message: "search.vector_precision must be in the range 1-10.".to_string(),
		});
	}
	if cfg.search.published_status.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.published_status must be non-empty.".to_string(),
		});
	}
	if cfg.search.max_facet_values == 0 {
		return Err(Error::Validation {
			message: "search.max_facet_values must be greater than zero.".to_string(),
		});
	}
	if cfg.categories.field.trim().is_empty() || cfg.categories.title_field.trim().is_empty() {
		return Err(Error::Validation {
			message: "categories.field and categories.title_field must be non-empty.".to_string(),
		});
	}
	if cfg.categories.field == cfg.categories.title_field {
		return Err(Error::Validation {
			message: "categories.field and categories.title_field must differ.".to_string(),
		});
	}
	if [&cfg.categories.field, &cfg.categories.title_field]
		.into_iter()
		.any(|field| RESERVED_FIELDS.contains(&field.as_str()))
	{
		return Err(Error::Validation {
			message: format!(
				"categories.field and categories.title_field must not name a fixed schema field \
				 ({RESERVED_FIELDS:?})."
			),
		});
	}

	let mut seen = HashSet::new();

	for name in &cfg.categories.canonical {
		if name.trim().is_empty() {
			return Err(Error::Validation {
				message: "categories.canonical must not contain empty names.".to_string(),
			});
		}
		if !seen.insert(mosaic_domain::normalize::normalize_name(name)) {
			return Err(Error::Validation {
				message: format!("categories.canonical contains a duplicate of {name:?}."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.relevance
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.relevance.api_key = None;
	}

	cfg.collections.legacy.retain(|name| !name.trim().is_empty());
	cfg.search.query_by.retain(|field| !field.trim().is_empty());
	cfg.categories.canonical.iter_mut().for_each(|name| *name = name.trim().to_string());
}
