use mosaic_storage::models::{SearchQuery, SearchResult, StoreHit};

use crate::{DocumentStore, Error, Result};

/// Outcome of an exhaustive page walk over one collection.
#[derive(Debug, Default)]
pub struct PageWalk {
	pub pages: u32,
	/// `found` as reported by the first page.
	pub found: u64,
	pub hits: Vec<StoreHit>,
}

/// Runs `queries` as one batch and returns one result per query, in submission order.
///
/// With several queries a failed slot is logged and contributes an empty result. A lone query
/// has nothing to fall back on, so its failure is returned. A failure of the batch call itself
/// is always returned.
pub async fn fan_out(
	store: &dyn DocumentStore,
	queries: &[SearchQuery],
) -> Result<Vec<SearchResult>> {
	let slots = store.multi_search(queries).await?;
	let mut out = Vec::with_capacity(queries.len());

	for (query, slot) in queries.iter().zip(slots) {
		out.push(tolerate(query, slot.map_err(Error::from), queries.len())?);
	}

	Ok(out)
}

/// Gathers the first `target` hits of every query with sequential page walks of `page_size`.
///
/// Used when the candidates a caller's page needs exceed what one store page can return. Slot
/// failures are handled as [`fan_out`] handles them.
pub async fn collect_candidates(
	store: &dyn DocumentStore,
	queries: &[SearchQuery],
	target: usize,
	page_size: u32,
) -> Result<Vec<SearchResult>> {
	let mut out = Vec::with_capacity(queries.len());

	for query in queries {
		let walk = walk(store, query, page_size, target).await.map(|walk| SearchResult {
			found: walk.found,
			hits: walk.hits,
			..SearchResult::default()
		});

		out.push(tolerate(query, walk, queries.len())?);
	}

	Ok(out)
}

/// Pages through every hit of `base` sequentially, `page_size` at a time.
///
/// Stops at the first page shorter than `page_size`. Errors propagate, so a missing collection
/// fails the walk.
pub async fn walk_pages(
	store: &dyn DocumentStore,
	base: &SearchQuery,
	page_size: u32,
) -> Result<PageWalk> {
	walk(store, base, page_size, usize::MAX).await
}

async fn walk(
	store: &dyn DocumentStore,
	base: &SearchQuery,
	page_size: u32,
	limit: usize,
) -> Result<PageWalk> {
	let page_size = page_size.max(1);
	let mut walk = PageWalk::default();
	let mut page = 1_u32;

	loop {
		let query = SearchQuery { page: Some(page), per_page: Some(page_size), ..base.clone() };
		let result = store.search(&query).await?;
		let fetched = result.hits.len();

		if page == 1 {
			walk.found = result.found;
		}

		walk.pages += 1;
		walk.hits.extend(result.hits);

		tracing::debug!(collection = %base.collection, page, fetched, "Fetched page.");

		if fetched < page_size as usize || walk.hits.len() >= limit {
			break;
		}

		page += 1;
	}

	walk.hits.truncate(limit);

	tracing::info!(
		collection = %base.collection,
		filter = base.filter_by.as_deref().unwrap_or_default(),
		pages = walk.pages,
		hits = walk.hits.len(),
		"Page walk completed."
	);

	Ok(walk)
}

fn tolerate(
	query: &SearchQuery,
	outcome: Result<SearchResult>,
	batch_len: usize,
) -> Result<SearchResult> {
	match outcome {
		Ok(result) => Ok(result),
		Err(err) if batch_len == 1 => Err(err),
		Err(Error::NotFound { .. }) => {
			tracing::warn!(collection = %query.collection, "Collection not found. Skipping.");

			Ok(SearchResult::default())
		},
		Err(err) => {
			tracing::warn!(
				error = %err,
				collection = %query.collection,
				"Collection search failed. Skipping."
			);

			Ok(SearchResult::default())
		},
	}
}
