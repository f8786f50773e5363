use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use mosaic_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("mosaic_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse template.");
	let table = root
		.as_table_mut()
		.and_then(|root| root.get_mut(section))
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{section}]."));

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = mosaic_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.collections.records, "records");
	assert_eq!(cfg.collections.legacy, vec!["legacy_records", "legacy_archive"]);
	assert_eq!(cfg.store.max_page_size, 250);
	assert_eq!(cfg.categories.canonical.len(), 4);
	assert!(cfg.providers.relevance.api_key.is_none());
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("mosaic_config_test_missing.toml");
	let err = mosaic_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn page_size_ceiling_is_enforced() {
	let payload = sample_toml_with("store", "max_page_size", Value::Integer(500));
	let path = write_temp_config(payload);
	let result = mosaic_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected page size validation error.");

	assert!(
		err.to_string().contains("store.max_page_size must be in the range 1-250."),
		"Unexpected error: {err}"
	);
}

#[test]
fn blend_alpha_must_be_in_unit_range() {
	let mut cfg = base_config();

	cfg.search.blend_alpha = 1.5;

	let err = mosaic_config::validate(&cfg).expect_err("Expected blend_alpha validation error.");

	assert!(
		err.to_string().contains("search.blend_alpha must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);

	cfg.search.blend_alpha = f32::NAN;

	let err = mosaic_config::validate(&cfg).expect_err("Expected blend_alpha finite error.");

	assert!(err.to_string().contains("search.blend_alpha must be a finite number."));
}

#[test]
fn embedding_dimensions_must_match_store() {
	let mut cfg = base_config();

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.dimensions = 1_024;
	}

	let err = mosaic_config::validate(&cfg).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string().contains("providers.embedding.dimensions must match store.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_provider_is_optional() {
	let mut cfg = base_config();

	cfg.providers.embedding = None;

	assert!(mosaic_config::validate(&cfg).is_ok());
}

#[test]
fn legacy_collections_exclude_records() {
	let mut cfg = base_config();

	cfg.collections.legacy.push("records".to_string());

	let err = mosaic_config::validate(&cfg).expect_err("Expected legacy validation error.");

	assert!(err.to_string().contains("collections.legacy must not contain collections.records."));
}

#[test]
fn canonical_categories_reject_accent_duplicates() {
	let mut cfg = base_config();

	cfg.categories.canonical.push("musica".to_string());

	let err = mosaic_config::validate(&cfg).expect_err("Expected duplicate category error.");

	assert!(
		err.to_string().contains("categories.canonical contains a duplicate of \"musica\"."),
		"Unexpected error: {err}"
	);
}

#[test]
fn category_and_title_fields_take_free_schema_slots() {
	let mut cfg = base_config();

	cfg.categories.field = "tema".to_string();
	cfg.categories.title_field = "nome".to_string();

	assert!(mosaic_config::validate(&cfg).is_ok());

	cfg.categories.title_field = "tema".to_string();

	let err = mosaic_config::validate(&cfg).expect_err("Expected distinct field error.");

	assert!(err.to_string().contains("must differ."), "Unexpected error: {err}");

	cfg.categories.title_field = "title".to_string();
	cfg.categories.field = "status".to_string();

	let err = mosaic_config::validate(&cfg).expect_err("Expected fixed field error.");

	assert!(
		err.to_string().contains("must not name a fixed schema field"),
		"Unexpected error: {err}"
	);
}
