pub mod fanout;
pub mod merge;
pub mod paginate;
pub mod planner;

pub use merge::{ScoredHit, SearchHit};

use serde::{Deserialize, Serialize};

use mosaic_domain::{LogicalDocument, normalize::truncate_chars};
use mosaic_storage::models::{SearchQuery, SearchResult};

use crate::{Error, MosaicService, Result};
use planner::PlanRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub collections: Vec<String>,
	pub query: String,
	pub page: u32,
	pub per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedResult {
	/// Sum of every collection's own `found`, taken before overlay filtering. May overcount.
	pub found: u64,
	pub page: u32,
	pub hits: Vec<LogicalDocument>,
}

impl MosaicService {
	/// Hybrid search over several collections with one merged, overlay-filtered, re-paged result.
	pub async fn search_across_collections(&self, req: SearchRequest) -> Result<MergedResult> {
		planner::validate_collections(&req.collections)?;
		validate_paging(req.page, req.per_page)?;

		let vector = self.query_vector(&req.query).await;
		let queries = planner::plan(
			&self.cfg,
			&PlanRequest {
				collections: &req.collections,
				query: &req.query,
				vector: vector.as_deref(),
				page: req.page,
				per_page: req.per_page,
			},
		)?;
		let needed = planner::required_candidates(req.page, req.per_page);
		let results = if needed > self.cfg.store.max_page_size {
			tracing::debug!(needed, "Candidate window exceeds one store page. Walking pages.");

			fanout::collect_candidates(
				self.store.as_ref(),
				&queries,
				needed as usize,
				self.cfg.store.max_page_size,
			)
			.await?
		} else {
			fanout::fan_out(self.store.as_ref(), &queries).await?
		};
		let found: u64 = results.iter().map(|result| result.found).sum();
		let hits = decode_hits(&queries, results);
		let mut hits = self.overlay().retain_live(hits).await;

		merge::sort_by_text_vector(&mut hits);

		let hits = paginate::paginate(hits, req.page, req.per_page)
			.into_iter()
			.map(|hit| hit.document)
			.collect();

		Ok(MergedResult { found, page: req.page, hits })
	}

	/// Embeds the query for the vector side of a hybrid search.
	///
	/// `Ok(None)` means text-only by configuration: no embedding provider, or a blank query.
	pub async fn embed_query(&self, query: &str) -> Result<Option<Vec<f32>>> {
		let Some(cfg) = self.cfg.providers.embedding.as_ref() else {
			return Ok(None);
		};
		let query = query.trim();

		if query.is_empty() {
			return Ok(None);
		}

		let input = truncate_chars(query, cfg.max_input_chars);
		let vector = self
			.providers
			.embedding
			.embed(cfg, input)
			.await
			.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;
		let expected = cfg.dimensions as usize;

		if vector.len() != expected {
			return Err(Error::DimensionMismatch { expected, actual: vector.len() });
		}

		Ok(Some(vector))
	}

	async fn query_vector(&self, query: &str) -> Option<Vec<f32>> {
		match self.embed_query(query).await {
			Ok(vector) => vector,
			Err(err) => {
				tracing::warn!(error = %err, "Embedding failed. Falling back to text-only search.");

				None
			},
		}
	}
}

pub(crate) fn validate_paging(page: u32, per_page: u32) -> Result<()> {
	if page == 0 {
		return Err(Error::invalid("page must be at least 1."));
	}
	if per_page == 0 {
		return Err(Error::invalid("per_page must be at least 1."));
	}

	Ok(())
}

fn decode_hits(queries: &[SearchQuery], results: Vec<SearchResult>) -> Vec<SearchHit> {
	let mut out = Vec::new();

	for (query, result) in queries.iter().zip(results) {
		for hit in result.hits {
			match SearchHit::from_store(hit, &query.collection) {
				Ok(hit) => out.push(hit),
				Err(err) => {
					tracing::warn!(
						error = %err,
						collection = %query.collection,
						"Skipping undecodable search hit."
					);
				},
			}
		}
	}

	out
}
