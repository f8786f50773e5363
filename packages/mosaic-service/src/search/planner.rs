use std::fmt::Write as _;

use mosaic_storage::{models::SearchQuery, schema::VECTOR_FIELD};

use crate::{Error, Result};

/// Inputs shared by every per-collection query of one logical search.
pub struct PlanRequest<'a> {
	pub collections: &'a [String],
	pub query: &'a str,
	pub vector: Option<&'a [f32]>,
	pub page: u32,
	pub per_page: u32,
}

/// Turns one logical search into one store query per collection, in input order.
///
/// The caller's page never reaches the store. Each collection is asked for its first
/// `page * per_page` candidates and paging happens after merge. One query carries at most the
/// store ceiling; deeper windows are gathered by walking pages.
pub fn plan(cfg: &mosaic_config::Config, req: &PlanRequest<'_>) -> Result<Vec<SearchQuery>> {
	validate_collections(req.collections)?;

	let q = match req.query.trim() {
		"" => "*".to_string(),
		trimmed => trimmed.to_string(),
	};
	let vector_query = req
		.vector
		.map(|vector| vector_clause(vector, cfg.search.blend_alpha, cfg.search.vector_precision));
	let window = candidate_window(req.page, req.per_page, cfg.store.max_page_size);
	let published = status_filter(&cfg.search.published_status)?;

	Ok(req
		.collections
		.iter()
		.map(|collection| SearchQuery {
			collection: collection.clone(),
			q: q.clone(),
			query_by: cfg.search.query_by.clone(),
			filter_by: (collection == &cfg.collections.records).then(|| published.clone()),
			include_fields: cfg.search.include_fields.clone(),
			exclude_fields: cfg.search.exclude_fields.clone(),
			vector_query: vector_query.clone(),
			per_page: Some(window),
			..SearchQuery::default()
		})
		.collect())
}

pub fn validate_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Err(Error::invalid("At least one collection is required."));
	}
	if collections.iter().any(|name| name.trim().is_empty()) {
		return Err(Error::invalid("Collection names must be non-empty."));
	}

	Ok(())
}

/// `embedding:([0.100000,-0.250000], alpha: 0.30)` with every component at `precision` places.
pub fn vector_clause(vector: &[f32], alpha: f32, precision: usize) -> String {
	let mut out = String::with_capacity(vector.len() * (precision + 4) + 32);

	out.push_str(VECTOR_FIELD);
	out.push_str(":([");

	for (i, value) in vector.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		let _ = write!(out, "{value:.precision$}");
	}

	let _ = write!(out, "], alpha: {alpha:.2})");

	out
}

/// Exact-match filter on a string field. Values are backtick-quoted so commas and spaces survive;
/// a value that itself contains a backtick cannot be expressed and is rejected.
pub fn exact_filter(field: &str, value: &str) -> Result<String> {
	if field.trim().is_empty() || field.contains([':', '`', ' ']) {
		return Err(Error::invalid(format!("Filter field {field:?} is malformed.")));
	}
	if value.contains('`') {
		return Err(Error::invalid(format!(
			"Filter value {value:?} must not contain backticks."
		)));
	}

	Ok(format!("{field}:=`{value}`"))
}

pub fn status_filter(status: &str) -> Result<String> {
	exact_filter("status", status)
}

pub fn and_filters(filters: impl IntoIterator<Item = String>) -> Option<String> {
	let joined = filters.into_iter().collect::<Vec<_>>().join(" && ");

	(!joined.is_empty()).then_some(joined)
}

/// Candidates each collection must contribute so the caller's page is complete after merge.
pub fn required_candidates(page: u32, per_page: u32) -> u32 {
	page.max(1).saturating_mul(per_page).max(1)
}

pub fn candidate_window(page: u32, per_page: u32, max_page_size: u32) -> u32 {
	required_candidates(page, per_page).min(max_page_size.max(1))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_clause_uses_fixed_precision_and_blend() {
		let clause = vector_clause(&[0.1, -0.25, 1.0], 0.3, 4);

		assert_eq!(clause, "embedding:([0.1000,-0.2500,1.0000], alpha: 0.30)");
	}

	#[test]
	fn empty_collection_list_is_rejected() {
		let err = validate_collections(&[]).expect_err("Expected invalid request.");

		assert!(matches!(err, Error::InvalidRequest { .. }));
		assert!(validate_collections(&[" ".to_string()]).is_err());
	}

	#[test]
	fn filters_quote_values_and_reject_backticks() {
		assert_eq!(
			exact_filter("category", "Patrimônio, Imaterial").ok().as_deref(),
			Some("category:=`Patrimônio, Imaterial`")
		);
		assert!(exact_filter("category", "a`b").is_err());
		assert!(exact_filter("cat egory", "a").is_err());
		assert_eq!(
			and_filters(["a:=`1`".to_string(), "b:=`2`".to_string()]).as_deref(),
			Some("a:=`1` && b:=`2`")
		);
		assert_eq!(and_filters(Vec::new()), None);
	}

	#[test]
	fn candidate_window_covers_requested_page_within_ceiling() {
		assert_eq!(candidate_window(1, 10, 250), 10);
		assert_eq!(candidate_window(3, 10, 250), 30);
		assert_eq!(candidate_window(40, 10, 250), 250);
		assert_eq!(candidate_window(0, 10, 250), 10);
		assert_eq!(candidate_window(u32::MAX, u32::MAX, 250), 250);
		assert_eq!(required_candidates(26, 10), 260);
		assert_eq!(required_candidates(0, 0), 1);
	}
}
