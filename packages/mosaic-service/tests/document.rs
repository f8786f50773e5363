use std::sync::Arc;

use serde_json::json;

use mosaic_domain::DocumentRef;
use mosaic_service::{
	Error, MosaicService, Providers, RedirectionIndex, SearchRequest, StoreRedirectionIndex,
};
use mosaic_testkit::{
	FakeEmbedding, FakeRedirects, FakeRelevance, FakeStore, Harness, LEGACY, OVERLAY, RECORDS,
	StoreCall, test_config,
};

fn overlay_entry(legacy_id: &str, replacement_id: &str, created_at: i64) -> serde_json::Value {
	json!({
		"id": format!("{legacy_id}-{created_at}"),
		"legacy_collection": LEGACY,
		"legacy_id": legacy_id,
		"replacement_id": replacement_id,
		"created_at": created_at,
		"created_by": "curator",
	})
}

#[tokio::test]
async fn redirected_legacy_id_returns_the_canonical_replacement() {
	let store = FakeStore::new()
		.with_document(LEGACY, json!({ "id": "id1", "title": "Antigo" }))
		.with_document(RECORDS, json!({ "id": "newid", "title": "Novo", "status": "published" }));
	let harness = Harness::builder(store)
		.redirects(FakeRedirects::new().with_redirect(LEGACY, "id1", "newid"))
		.build();
	let fetched = harness.service.get_by_id(LEGACY, "id1").await.expect("Lookup failed.");

	assert_eq!(fetched.collection, RECORDS);
	assert_eq!(fetched.document.id, "newid");
	assert_eq!(fetched.document.title.as_deref(), Some("Novo"));
	assert_eq!(fetched.redirected_from, Some(DocumentRef::new(LEGACY, "id1")));
	assert_eq!(
		harness.store.calls(),
		vec![StoreCall::GetDocument { collection: RECORDS.to_string(), id: "newid".to_string() }]
	);
}

#[tokio::test]
async fn non_legacy_collections_are_read_directly() {
	let store = FakeStore::new().with_document("c1", json!({ "id": "a", "title": "Casa" }));
	let harness = Harness::builder(store)
		.redirects(FakeRedirects::new().with_redirect("c1", "a", "elsewhere"))
		.build();
	let fetched = harness.service.get_by_id("c1", "a").await.expect("Lookup failed.");

	assert_eq!(fetched.collection, "c1");
	assert_eq!(fetched.document.id, "a");
	assert_eq!(fetched.redirected_from, None);
	assert!(harness.redirects.lookups().is_empty());
}

#[tokio::test]
async fn single_document_errors_are_surfaced() {
	let store = FakeStore::new().with_collection(LEGACY);
	let harness = Harness::new(store);
	let err = harness.service.get_by_id(LEGACY, "nope").await.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }));

	let harness = Harness::builder(FakeStore::new().with_collection(LEGACY))
		.redirects(FakeRedirects::failing())
		.build();
	let err = harness.service.get_by_id(LEGACY, "id1").await.expect_err("Expected upstream.");

	assert!(matches!(err, Error::Upstream { .. }));

	let err = harness.service.get_by_id(LEGACY, " ").await.expect_err("Expected invalid.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn store_index_returns_the_newest_entry_for_a_legacy_document() {
	let store = Arc::new(
		FakeStore::new()
			.with_document(OVERLAY, overlay_entry("id1", "older", 100))
			.with_document(OVERLAY, overlay_entry("id1", "newid", 200))
			.with_document(OVERLAY, overlay_entry("id2", "other", 300)),
	);
	let index = StoreRedirectionIndex::new(store.clone(), OVERLAY);
	let entry = index
		.lookup(LEGACY, "id1")
		.await
		.expect("Lookup failed.")
		.expect("Expected an entry.");

	assert_eq!(entry.replacement_id, "newid");
	assert_eq!(entry.created_at.unix_timestamp(), 200);
	assert_eq!(entry.created_by, "curator");
	assert!(index.lookup(LEGACY, "id3").await.expect("Lookup failed.").is_none());
	assert!(index.lookup("legacy_archive", "id1").await.expect("Lookup failed.").is_none());
}

#[tokio::test]
async fn store_index_treats_a_missing_overlay_as_empty() {
	let store = Arc::new(FakeStore::new());
	let index = StoreRedirectionIndex::new(store, OVERLAY);

	assert!(index.lookup(LEGACY, "id1").await.expect("Lookup failed.").is_none());
}

#[tokio::test]
async fn overlay_collection_drives_search_and_lookup_end_to_end() {
	let store = Arc::new(
		FakeStore::new()
			.with_document(OVERLAY, overlay_entry("id1", "newid", 100))
			.with_hit(LEGACY, json!({ "id": "id1", "title": "Antigo" }), 9, None)
			.with_hit(LEGACY, json!({ "id": "id2", "title": "Outro" }), 3, None)
			.with_hit(
				RECORDS,
				json!({ "id": "newid", "title": "Novo", "status": "published" }),
				6,
				None,
			),
	);
	let redirects = Arc::new(StoreRedirectionIndex::new(store.clone(), OVERLAY));
	let service = MosaicService::with_parts(
		test_config(),
		store,
		redirects,
		Providers::new(
			Arc::new(FakeEmbedding::returning(vec![0.0; 4])),
			Arc::new(FakeRelevance::new()),
		),
	);
	let result = service
		.search_across_collections(SearchRequest {
			collections: vec![LEGACY.to_string(), RECORDS.to_string()],
			query: "casa".to_string(),
			page: 1,
			per_page: 10,
		})
		.await
		.expect("Search failed.");
	let ids: Vec<_> = result.hits.iter().map(|doc| doc.id.as_str()).collect();

	assert_eq!(ids, vec!["newid", "id2"]);

	let fetched = service.get_by_id(LEGACY, "id1").await.expect("Lookup failed.");

	assert_eq!(fetched.document.id, "newid");
}
