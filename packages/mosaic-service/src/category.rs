use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mosaic_domain::{LogicalDocument, normalize::normalize_name};
use mosaic_storage::models::{SearchQuery, StoreHit};

use crate::{
	Error, MosaicService, Result,
	search::{
		MergedResult,
		fanout::{self, PageWalk},
		merge::{self, ScoredHit},
		paginate, planner, validate_paging,
	},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySearchRequest {
	pub collections: Vec<String>,
	pub category: String,
	pub page: u32,
	pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRelevance {
	pub name: String,
	pub total_relevance: i64,
	pub document_count: u64,
	/// `total_relevance / document_count`, or 0 when the category is empty.
	pub average_relevance: f64,
	pub normalized_name: String,
}

#[derive(Debug)]
struct Tally {
	name: String,
	canonical: bool,
	total: i64,
	count: u64,
}

impl MosaicService {
	/// Every document of one category across `collections`, ordered by relevance.
	pub async fn search_by_category(&self, req: CategorySearchRequest) -> Result<MergedResult> {
		planner::validate_collections(&req.collections)?;
		validate_paging(req.page, req.per_page)?;

		let category = req.category.trim();

		if category.is_empty() {
			return Err(Error::invalid("category must be non-empty."));
		}

		let mut found = 0_u64;
		let mut hits = Vec::new();

		for collection in &req.collections {
			let base = SearchQuery {
				include_fields: self.cfg.search.include_fields.clone(),
				exclude_fields: self.cfg.search.exclude_fields.clone(),
				..self.category_query(collection, category)?
			};
			let Some(walk) = self.tolerant_walk(&base, category).await? else {
				continue;
			};

			found += walk.found;

			hits.extend(scored_hits(collection, walk.hits));
		}

		let mut hits = self.overlay().retain_live(hits).await;

		for hit in &mut hits {
			hit.relevance = self.relevance_of(&hit.source_collection, &hit.document).await;
		}

		merge::sort_by_relevance(&mut hits);

		let hits = paginate::paginate(hits, req.page, req.per_page)
			.into_iter()
			.map(|hit| hit.document)
			.collect();

		Ok(MergedResult { found, page: req.page, hits })
	}

	/// Aggregate relevance per category over every document of every collection.
	///
	/// Canonical categories are always present, even with no documents. Categories that only
	/// differ by case or accents are counted together.
	pub async fn category_relevance(
		&self,
		collections: &[String],
	) -> Result<Vec<CategoryRelevance>> {
		planner::validate_collections(collections)?;

		let mut tallies: BTreeMap<String, Tally> = self
			.cfg
			.categories
			.canonical
			.iter()
			.map(|name| {
				let tally = Tally { name: name.clone(), canonical: true, total: 0, count: 0 };

				(normalize_name(name), tally)
			})
			.collect();

		for collection in collections {
			for value in self.discover_categories(collection).await? {
				let base = SearchQuery {
					include_fields: vec!["id".to_string(), self.cfg.categories.title_field.clone()],
					..self.category_query(collection, &value)?
				};
				let Some(walk) = self.tolerant_walk(&base, &value).await? else {
					continue;
				};
				let hits = self.overlay().retain_live(scored_hits(collection, walk.hits)).await;
				let mut total = 0_i64;

				for hit in &hits {
					let score = self.relevance_of(collection, &hit.document).await;

					total = total.saturating_add(score);
				}

				let tally = tallies.entry(normalize_name(&value)).or_insert_with(|| Tally {
					name: value.clone(),
					canonical: false,
					total: 0,
					count: 0,
				});

				if !tally.canonical && value < tally.name {
					tally.name = value.clone();
				}

				tally.total = tally.total.saturating_add(total);
				tally.count += hits.len() as u64;
			}
		}

		let mut out: Vec<CategoryRelevance> = tallies
			.into_iter()
			.map(|(normalized_name, tally)| CategoryRelevance {
				average_relevance: if tally.count == 0 {
					0.0
				} else {
					tally.total as f64 / tally.count as f64
				},
				name: tally.name,
				total_relevance: tally.total,
				document_count: tally.count,
				normalized_name,
			})
			.collect();

		out.sort_by(|a, b| {
			b.total_relevance
				.cmp(&a.total_relevance)
				.then_with(|| a.normalized_name.cmp(&b.normalized_name))
		});

		Ok(out)
	}

	/// Wildcard query restricted to one category, and to published documents in the records
	/// collection.
	fn category_query(&self, collection: &str, category: &str) -> Result<SearchQuery> {
		let mut filters = vec![planner::exact_filter(&self.cfg.categories.field, category)?];

		if collection == self.cfg.collections.records {
			filters.push(planner::status_filter(&self.cfg.search.published_status)?);
		}

		Ok(SearchQuery {
			filter_by: planner::and_filters(filters),
			..SearchQuery::wildcard(collection)
		})
	}

	/// Category values present in `collection`, from a facet-only query.
	async fn discover_categories(&self, collection: &str) -> Result<Vec<String>> {
		let mut query = SearchQuery {
			facet_by: vec![self.cfg.categories.field.clone()],
			max_facet_values: Some(self.cfg.search.max_facet_values),
			per_page: Some(0),
			..SearchQuery::wildcard(collection)
		};

		if collection == self.cfg.collections.records {
			query.filter_by = Some(planner::status_filter(&self.cfg.search.published_status)?);
		}

		let result = match self.store.search(&query).await {
			Ok(result) => result,
			Err(err) => {
				tracing::warn!(
					error = %err,
					collection,
					"Category discovery failed. Skipping collection."
				);

				return Ok(Vec::new());
			},
		};

		Ok(result
			.facet_values(&self.cfg.categories.field)
			.filter(|facet| !facet.value.trim().is_empty())
			.map(|facet| facet.value.clone())
			.collect())
	}

	/// Walks one collection. Store failures skip the collection; only request errors propagate.
	async fn tolerant_walk(
		&self,
		base: &SearchQuery,
		category: &str,
	) -> Result<Option<PageWalk>> {
		match fanout::walk_pages(self.store.as_ref(), base, self.cfg.store.max_page_size).await {
			Ok(walk) => Ok(Some(walk)),
			Err(err @ Error::InvalidRequest { .. }) => Err(err),
			Err(err) => {
				tracing::warn!(
					error = %err,
					collection = %base.collection,
					category,
					"Category walk failed. Skipping collection."
				);

				Ok(None)
			},
		}
	}

	/// Relevance of one document by its title. Untitled documents and lookup failures score 0.
	async fn relevance_of(&self, collection: &str, document: &LogicalDocument) -> i64 {
		let Some(title) = document
			.str_field(&self.cfg.categories.title_field)
			.map(str::trim)
			.filter(|title| !title.is_empty())
		else {
			return 0;
		};

		match self.providers.relevance.score_by_title(&self.cfg.providers.relevance, title).await {
			Ok(score) => score,
			Err(err) => {
				let err = Error::Relevance { message: err.to_string() };

				tracing::warn!(
					error = %err,
					collection,
					document_id = %document.id,
					"Relevance lookup failed. Scoring as zero."
				);

				0
			},
		}
	}
}

fn scored_hits(collection: &str, hits: Vec<StoreHit>) -> Vec<ScoredHit> {
	hits.into_iter()
		.filter_map(|hit| match LogicalDocument::from_fields(hit.document) {
			Ok(document) => Some(ScoredHit {
				document,
				relevance: 0,
				source_collection: collection.to_string(),
			}),
			Err(err) => {
				tracing::warn!(error = %err, collection, "Skipping undecodable category hit.");

				None
			},
		})
		.collect()
}
