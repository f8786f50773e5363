use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use mosaic_domain::LogicalDocument;
use mosaic_storage::models::StoreHit;

/// One hit of a hybrid search, tagged with the collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	pub document: LogicalDocument,
	pub text_match: u64,
	pub vector_distance: Option<f32>,
	pub source_collection: String,
}
impl SearchHit {
	pub fn from_store(hit: StoreHit, collection: &str) -> serde_json::Result<Self> {
		Ok(Self {
			document: LogicalDocument::from_fields(hit.document)?,
			text_match: hit.text_match,
			vector_distance: hit.vector_distance,
			source_collection: collection.to_string(),
		})
	}

	fn distance_key(&self) -> f32 {
		self.vector_distance.unwrap_or(f32::INFINITY)
	}
}

/// One hit of a category browse, scored by the relevance source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
	pub document: LogicalDocument,
	pub relevance: i64,
	pub source_collection: String,
}

/// Text match descending, then vector distance ascending with an absent distance last.
pub fn text_vector_order(a: &SearchHit, b: &SearchHit) -> Ordering {
	b.text_match.cmp(&a.text_match).then_with(|| a.distance_key().total_cmp(&b.distance_key()))
}

/// Stable, so hits that compare equal keep collection input order.
pub fn sort_by_text_vector(hits: &mut [SearchHit]) {
	hits.sort_by(text_vector_order);
}

pub fn relevance_order(a: &ScoredHit, b: &ScoredHit) -> Ordering {
	b.relevance.cmp(&a.relevance)
}

/// Stable. Equal relevance keeps input order.
pub fn sort_by_relevance(hits: &mut [ScoredHit]) {
	hits.sort_by(relevance_order);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(id: &str, text_match: u64, vector_distance: Option<f32>) -> SearchHit {
		SearchHit {
			document: LogicalDocument::new(id),
			text_match,
			vector_distance,
			source_collection: "c".to_string(),
		}
	}

	fn ids(hits: &[SearchHit]) -> Vec<&str> {
		hits.iter().map(|hit| hit.document.id.as_str()).collect()
	}

	#[test]
	fn text_match_dominates_and_distance_breaks_ties() {
		let mut hits = vec![
			hit("low", 5, Some(0.01)),
			hit("far", 10, Some(0.9)),
			hit("none", 10, None),
			hit("near", 10, Some(0.1)),
		];

		sort_by_text_vector(&mut hits);

		assert_eq!(ids(&hits), vec!["near", "far", "none", "low"]);
	}

	#[test]
	fn full_ties_keep_input_order() {
		let mut hits = vec![hit("a", 3, None), hit("b", 3, None), hit("c", 3, None)];

		sort_by_text_vector(&mut hits);

		assert_eq!(ids(&hits), vec!["a", "b", "c"]);
	}

	#[test]
	fn relevance_order_is_descending_and_stable() {
		let scored = |id: &str, relevance| ScoredHit {
			document: LogicalDocument::new(id),
			relevance,
			source_collection: "c".to_string(),
		};
		let mut hits = vec![scored("a", 1), scored("b", 7), scored("c", 1), scored("d", 7)];

		sort_by_relevance(&mut hits);

		let order: Vec<_> = hits.iter().map(|hit| hit.document.id.as_str()).collect();

		assert_eq!(order, vec!["b", "d", "a", "c"]);
	}
}
