use serde_json::{Map, Value};

use crate::{Error, Result};

/// One search against one collection, in the store's query vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
	pub collection: String,
	pub q: String,
	pub query_by: Vec<String>,
	pub filter_by: Option<String>,
	pub include_fields: Vec<String>,
	pub exclude_fields: Vec<String>,
	pub vector_query: Option<String>,
	pub facet_by: Vec<String>,
	pub max_facet_values: Option<u32>,
	pub sort_by: Option<String>,
	pub page: Option<u32>,
	pub per_page: Option<u32>,
}
impl SearchQuery {
	/// Match-everything query, the starting point for browse and facet requests.
	pub fn wildcard(collection: impl Into<String>) -> Self {
		Self { collection: collection.into(), q: "*".to_string(), ..Self::default() }
	}

	pub fn to_json(&self) -> Value {
		let mut out = Map::new();

		out.insert("collection".to_string(), Value::String(self.collection.clone()));

		for (key, value) in self.to_params() {
			let value = match key {
				"page" | "per_page" | "max_facet_values" => value
					.parse::<u64>()
					.map(Value::from)
					.unwrap_or(Value::String(value)),
				_ => Value::String(value),
			};

			out.insert(key.to_string(), value);
		}

		Value::Object(out)
	}

	/// Query-string form used by single-collection searches.
	pub fn to_params(&self) -> Vec<(&'static str, String)> {
		let mut params = vec![("q", self.q.clone())];

		if !self.query_by.is_empty() {
			params.push(("query_by", self.query_by.join(",")));
		}
		if let Some(filter_by) = self.filter_by.as_ref() {
			params.push(("filter_by", filter_by.clone()));
		}
		if !self.include_fields.is_empty() {
			params.push(("include_fields", self.include_fields.join(",")));
		}
		if !self.exclude_fields.is_empty() {
			params.push(("exclude_fields", self.exclude_fields.join(",")));
		}
		if let Some(vector_query) = self.vector_query.as_ref() {
			params.push(("vector_query", vector_query.clone()));
		}
		if !self.facet_by.is_empty() {
			params.push(("facet_by", self.facet_by.join(",")));
		}
		if let Some(max) = self.max_facet_values {
			params.push(("max_facet_values", max.to_string()));
		}
		if let Some(sort_by) = self.sort_by.as_ref() {
			params.push(("sort_by", sort_by.clone()));
		}
		if let Some(page) = self.page {
			params.push(("page", page.to_string()));
		}
		if let Some(per_page) = self.per_page {
			params.push(("per_page", per_page.to_string()));
		}

		params
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
	pub document: Map<String, Value>,
	pub text_match: u64,
	pub vector_distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetValue {
	pub value: String,
	pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetCounts {
	pub field_name: String,
	pub counts: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
	pub found: u64,
	pub hits: Vec<StoreHit>,
	pub facet_counts: Vec<FacetCounts>,
}
impl SearchResult {
	pub fn facet_values(&self, field_name: &str) -> impl Iterator<Item = &FacetValue> {
		self.facet_counts
			.iter()
			.filter(move |facet| facet.field_name == field_name)
			.flat_map(|facet| facet.counts.iter())
	}
}

pub fn parse_search_result(json: &Value) -> Result<SearchResult> {
	let found = json.get("found").and_then(Value::as_u64).unwrap_or(0);
	let mut hits = Vec::new();

	if let Some(raw_hits) = json.get("hits").and_then(Value::as_array) {
		for raw in raw_hits {
			hits.push(parse_hit(raw)?);
		}
	}

	let mut facet_counts = Vec::new();

	if let Some(raw_facets) = json.get("facet_counts").and_then(Value::as_array) {
		for raw in raw_facets {
			let Some(field_name) = raw.get("field_name").and_then(Value::as_str) else {
				continue;
			};
			let counts = raw
				.get("counts")
				.and_then(Value::as_array)
				.map(|counts| {
					counts
						.iter()
						.filter_map(|count| {
							Some(FacetValue {
								value: count.get("value")?.as_str()?.to_string(),
								count: count.get("count").and_then(Value::as_u64).unwrap_or(0),
							})
						})
						.collect()
				})
				.unwrap_or_default();

			facet_counts.push(FacetCounts { field_name: field_name.to_string(), counts });
		}
	}

	Ok(SearchResult { found, hits, facet_counts })
}

/// Splits a multi-search response into one outcome per submitted query, in submission order.
pub fn parse_multi_search(
	json: &Value,
	collections: &[String],
) -> Result<Vec<Result<SearchResult>>> {
	let results = json.get("results").and_then(Value::as_array).ok_or_else(|| Error::Upstream {
		status: 200,
		message: "Multi-search response is missing results.".to_string(),
	})?;

	if results.len() != collections.len() {
		return Err(Error::Upstream {
			status: 200,
			message: format!(
				"Multi-search returned {} results for {} searches.",
				results.len(),
				collections.len()
			),
		});
	}

	Ok(results
		.iter()
		.zip(collections)
		.map(|(slot, collection)| match slot.get("error").and_then(Value::as_str) {
			Some(message) => {
				let status = slot.get("code").and_then(Value::as_u64).unwrap_or(500) as u16;

				Err(status_error(status, collection, message))
			},
			None => parse_search_result(slot),
		})
		.collect())
}

pub(crate) fn status_error(status: u16, subject: &str, message: &str) -> Error {
	match status {
		404 => Error::NotFound(subject.to_string()),
		409 => Error::AlreadyExists(subject.to_string()),
		_ => Error::Upstream { status, message: message.to_string() },
	}
}

fn parse_hit(raw: &Value) -> Result<StoreHit> {
	let document = raw
		.get("document")
		.and_then(Value::as_object)
		.cloned()
		.ok_or_else(|| Error::Upstream {
			status: 200,
			message: "Search hit is missing document.".to_string(),
		})?;
	let text_match = raw.get("text_match").and_then(Value::as_u64).unwrap_or(0);
	let vector_distance = raw.get("vector_distance").and_then(Value::as_f64).map(|d| d as f32);

	Ok(StoreHit { document, text_match, vector_distance })
}
