use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap, HashSet},
	sync::Mutex,
};

use serde_json::{Map, Value};

use mosaic_service::{BoxFuture, DocumentStore};
use mosaic_storage::{
	Error as StoreError, Result as StoreResult,
	models::{FacetCounts, FacetValue, SearchQuery, SearchResult, StoreHit},
	schema::CollectionSchema,
};

const DEFAULT_PER_PAGE: u32 = 10;

/// A store call as the fake received it.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
	MultiSearch(Vec<SearchQuery>),
	Search(SearchQuery),
	GetDocument { collection: String, id: String },
	RetrieveCollection(String),
	CreateCollection(String),
}

#[derive(Debug, Clone)]
struct FakeDocument {
	fields: Map<String, Value>,
	text_match: u64,
	vector_distance: Option<f32>,
}

#[derive(Debug, Default)]
struct FakeCollection {
	schema: Option<CollectionSchema>,
	documents: Vec<FakeDocument>,
}

#[derive(Debug, Default)]
struct StoreState {
	collections: BTreeMap<String, FakeCollection>,
	failing: HashMap<String, u16>,
	batch_failure: Option<u16>,
	retrieve_failure: Option<u16>,
	create_failure: Option<u16>,
	create_race: HashSet<String>,
	calls: Vec<StoreCall>,
}

/// In-memory document store.
///
/// Every document of a collection matches every `q`; the score a hit carries is the one it was
/// inserted with. Filters understand the ``field:=`value` `` clauses joined by ` && ` that the
/// service emits. Hits come back in text-match order unless `sort_by` names a numeric field.
#[derive(Debug, Default)]
pub struct FakeStore {
	state: Mutex<StoreState>,
}
impl FakeStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_collection(self, name: &str) -> Self {
		self.lock().collections.entry(name.to_string()).or_default();

		self
	}

	/// Adds a document that is returned with the given scores by every search.
	pub fn with_hit(
		self,
		collection: &str,
		fields: Value,
		text_match: u64,
		vector_distance: Option<f32>,
	) -> Self {
		let Value::Object(fields) = fields else {
			panic!("Fake documents must be JSON objects.");
		};

		self.lock()
			.collections
			.entry(collection.to_string())
			.or_default()
			.documents
			.push(FakeDocument { fields, text_match, vector_distance });

		self
	}

	pub fn with_document(self, collection: &str, fields: Value) -> Self {
		self.with_hit(collection, fields, 0, None)
	}

	/// Searches against `collection` fail with `status`.
	pub fn with_failing_collection(self, collection: &str, status: u16) -> Self {
		self.lock().failing.insert(collection.to_string(), status);

		self
	}

	/// The batch call itself fails, as a transport error would.
	pub fn with_batch_failure(self, status: u16) -> Self {
		self.lock().batch_failure = Some(status);

		self
	}

	pub fn with_retrieve_failure(self, status: u16) -> Self {
		self.lock().retrieve_failure = Some(status);

		self
	}

	pub fn with_create_failure(self, status: u16) -> Self {
		self.lock().create_failure = Some(status);

		self
	}

	/// Another writer creates `collection` right before this store's create call lands.
	pub fn with_create_race(self, collection: &str) -> Self {
		self.lock().create_race.insert(collection.to_string());

		self
	}

	pub fn calls(&self) -> Vec<StoreCall> {
		self.lock().calls.clone()
	}

	/// Single-collection searches that asked for a specific page.
	pub fn page_fetches(&self, collection: &str) -> Vec<SearchQuery> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				StoreCall::Search(query) => Some(query),
				_ => None,
			})
			.filter(|query| query.collection == collection && query.page.is_some())
			.collect()
	}

	pub fn schema(&self, collection: &str) -> Option<CollectionSchema> {
		self.lock().collections.get(collection).and_then(|c| c.schema.clone())
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}

impl StoreState {
	fn run(&self, query: &SearchQuery) -> StoreResult<SearchResult> {
		if let Some(status) = self.failing.get(&query.collection) {
			return Err(StoreError::Upstream {
				status: *status,
				message: format!("Injected failure for {}.", query.collection),
			});
		}

		let collection = self
			.collections
			.get(&query.collection)
			.ok_or_else(|| StoreError::NotFound(query.collection.clone()))?;
		let clauses = parse_filter(query.filter_by.as_deref())?;
		let mut matched: Vec<&FakeDocument> = collection
			.documents
			.iter()
			.filter(|doc| clauses.iter().all(|(field, value)| field_matches(doc, field, value)))
			.collect();

		match query.sort_by.as_deref().and_then(|sort| sort.split_once(':')) {
			Some((field, direction)) => matched.sort_by(|a, b| {
				let order = numeric(a, field).total_cmp(&numeric(b, field));

				if direction == "desc" { order.reverse() } else { order }
			}),
			None => matched.sort_by(|a, b| {
				b.text_match.cmp(&a.text_match).then_with(|| {
					let a = a.vector_distance.unwrap_or(f32::INFINITY);
					let b = b.vector_distance.unwrap_or(f32::INFINITY);

					a.total_cmp(&b)
				})
			}),
		}

		let facet_counts = query
			.facet_by
			.iter()
			.map(|field| facet(&matched, field, query.max_facet_values))
			.collect();
		let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE) as usize;
		let start = (query.page.unwrap_or(1).max(1) as usize - 1).saturating_mul(per_page);
		let hits = matched
			.iter()
			.skip(start)
			.take(per_page)
			.map(|doc| StoreHit {
				document: project(&doc.fields, &query.include_fields, &query.exclude_fields),
				text_match: doc.text_match,
				vector_distance: doc.vector_distance,
			})
			.collect();

		Ok(SearchResult { found: matched.len() as u64, hits, facet_counts })
	}
}

impl DocumentStore for FakeStore {
	fn multi_search<'a>(
		&'a self,
		queries: &'a [SearchQuery],
	) -> BoxFuture<'a, StoreResult<Vec<StoreResult<SearchResult>>>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.calls.push(StoreCall::MultiSearch(queries.to_vec()));

			if let Some(status) = state.batch_failure {
				return Err(StoreError::Upstream {
					status,
					message: "Injected batch failure.".to_string(),
				});
			}

			Ok(queries.iter().map(|query| state.run(query)).collect())
		})
	}

	fn search<'a>(&'a self, query: &'a SearchQuery) -> BoxFuture<'a, StoreResult<SearchResult>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.calls.push(StoreCall::Search(query.clone()));

			state.run(query)
		})
	}

	fn get_document<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
	) -> BoxFuture<'a, StoreResult<Map<String, Value>>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.calls.push(StoreCall::GetDocument {
				collection: collection.to_string(),
				id: id.to_string(),
			});

			if let Some(status) = state.failing.get(collection) {
				return Err(StoreError::Upstream {
					status: *status,
					message: format!("Injected failure for {collection}."),
				});
			}

			state
				.collections
				.get(collection)
				.ok_or_else(|| StoreError::NotFound(collection.to_string()))?
				.documents
				.iter()
				.find(|doc| doc.fields.get("id").and_then(Value::as_str) == Some(id))
				.map(|doc| doc.fields.clone())
				.ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))
		})
	}

	fn retrieve_collection<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StoreResult<Value>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.calls.push(StoreCall::RetrieveCollection(name.to_string()));

			if let Some(status) = state.retrieve_failure {
				return Err(StoreError::Upstream {
					status,
					message: "Injected retrieve failure.".to_string(),
				});
			}

			match state.collections.get(name) {
				Some(collection) => Ok(serde_json::json!({
					"name": name,
					"num_documents": collection.documents.len(),
				})),
				None => Err(StoreError::NotFound(name.to_string())),
			}
		})
	}

	fn create_collection<'a>(
		&'a self,
		schema: &'a CollectionSchema,
	) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.calls.push(StoreCall::CreateCollection(schema.name.clone()));

			if let Some(status) = state.create_failure {
				return Err(StoreError::Upstream {
					status,
					message: "Injected create failure.".to_string(),
				});
			}
			if state.create_race.remove(&schema.name) {
				state.collections.entry(schema.name.clone()).or_default().schema =
					Some(schema.clone());
			}
			if state.collections.contains_key(&schema.name) {
				return Err(StoreError::AlreadyExists(schema.name.clone()));
			}

			state.collections.insert(
				schema.name.clone(),
				FakeCollection { schema: Some(schema.clone()), documents: Vec::new() },
			);

			Ok(())
		})
	}
}

fn parse_filter(filter: Option<&str>) -> StoreResult<Vec<(String, String)>> {
	let Some(filter) = filter else {
		return Ok(Vec::new());
	};

	filter
		.split(" && ")
		.map(|clause| {
			let (field, value) = clause
				.split_once(":=")
				.ok_or_else(|| StoreError::InvalidArgument(format!("Bad filter {clause:?}.")))?;
			let value = value
				.strip_prefix('`')
				.and_then(|value| value.strip_suffix('`'))
				.unwrap_or(value);

			Ok((field.to_string(), value.to_string()))
		})
		.collect()
}

fn field_matches(doc: &FakeDocument, field: &str, expected: &str) -> bool {
	match doc.fields.get(field) {
		Some(Value::String(value)) => value == expected,
		Some(Value::Array(values)) => values.iter().any(|value| value.as_str() == Some(expected)),
		Some(other) => other.to_string() == expected,
		None => false,
	}
}

fn numeric(doc: &FakeDocument, field: &str) -> f64 {
	doc.fields.get(field).and_then(Value::as_f64).unwrap_or(f64::MIN)
}

fn facet(documents: &[&FakeDocument], field: &str, limit: Option<u32>) -> FacetCounts {
	let mut counts: BTreeMap<String, u64> = BTreeMap::new();

	for doc in documents {
		if let Some(value) = doc.fields.get(field).and_then(Value::as_str) {
			*counts.entry(value.to_string()).or_default() += 1;
		}
	}

	let mut counts: Vec<FacetValue> =
		counts.into_iter().map(|(value, count)| FacetValue { value, count }).collect();

	counts.sort_by(|a, b| match b.count.cmp(&a.count) {
		Ordering::Equal => a.value.cmp(&b.value),
		other => other,
	});
	counts.truncate(limit.map_or(usize::MAX, |limit| limit as usize));

	FacetCounts { field_name: field.to_string(), counts }
}

fn project(
	fields: &Map<String, Value>,
	include: &[String],
	exclude: &[String],
) -> Map<String, Value> {
	fields
		.iter()
		.filter(|(name, _)| include.is_empty() || include.iter().any(|field| field == *name))
		.filter(|(name, _)| !exclude.iter().any(|field| field == *name))
		.map(|(name, value)| (name.clone(), value.clone()))
		.collect()
}
