use std::time::Duration;

use reqwest::{
	Client, RequestBuilder, Response,
	header::{HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};

use crate::{
	Error, Result,
	models::{self, SearchQuery, SearchResult},
	schema::CollectionSchema,
};

const API_KEY_HEADER: &str = "x-typesense-api-key";

/// HTTP client for a Typesense-compatible document store.
pub struct TypesenseStore {
	client: Client,
	base_url: String,
}
impl TypesenseStore {
	pub fn new(cfg: &mosaic_config::Store) -> Result<Self> {
		let mut headers = HeaderMap::new();

		headers.insert(API_KEY_HEADER, HeaderValue::from_str(&cfg.api_key)?);

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self { client, base_url: cfg.url.trim_end_matches('/').to_string() })
	}

	/// Runs every query in one request. The outer error covers transport failures; each slot
	/// carries its own outcome.
	pub async fn multi_search(
		&self,
		queries: &[SearchQuery],
	) -> Result<Vec<Result<SearchResult>>> {
		let collections: Vec<String> = queries.iter().map(|q| q.collection.clone()).collect();
		let body = serde_json::json!({
			"searches": queries.iter().map(SearchQuery::to_json).collect::<Vec<_>>(),
		});
		let request = self.client.post(format!("{}/multi_search", self.base_url)).json(&body);
		let json = send_json(request, "multi_search").await?;

		models::parse_multi_search(&json, &collections)
	}

	pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
		let request = self
			.client
			.get(format!("{}/documents/search", collection_url(&self.base_url, &query.collection)))
			.query(&query.to_params());
		let json = send_json(request, &query.collection).await?;

		models::parse_search_result(&json)
	}

	pub async fn get_document(&self, collection: &str, id: &str) -> Result<Map<String, Value>> {
		let request = self.client.get(document_url(&self.base_url, collection, id));
		let subject = format!("{collection}/{id}");

		match send_json(request, &subject).await? {
			Value::Object(fields) => Ok(fields),
			_ => Err(Error::Upstream {
				status: 200,
				message: format!("Document {subject} is not a JSON object."),
			}),
		}
	}

	pub async fn retrieve_collection(&self, name: &str) -> Result<Value> {
		let request = self.client.get(collection_url(&self.base_url, name));

		send_json(request, name).await
	}

	pub async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
		let request = self.client.post(format!("{}/collections", self.base_url)).json(schema);

		send_json(request, &schema.name).await?;

		Ok(())
	}
}

async fn send_json(request: RequestBuilder, subject: &str) -> Result<Value> {
	let response = request.send().await?;

	if !response.status().is_success() {
		return Err(error_from_response(response, subject).await);
	}

	Ok(response.json().await?)
}

async fn error_from_response(response: Response, subject: &str) -> Error {
	let status = response.status().as_u16();
	let message = match response.json::<Value>().await {
		Ok(json) => json
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| json.to_string()),
		Err(err) => err.to_string(),
	};

	tracing::debug!(status, subject, message = %message, "Store request failed.");

	models::status_error(status, subject, &message)
}

/// Collection names and document ids are caller input, so each one is escaped as a single path
/// segment.
fn collection_url(base_url: &str, collection: &str) -> String {
	format!("{base_url}/collections/{}", urlencoding::encode(collection))
}

fn document_url(base_url: &str, collection: &str, id: &str) -> String {
	format!("{}/documents/{}", collection_url(base_url, collection), urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
	use super::{collection_url, document_url};

	#[test]
	fn collection_and_document_urls_escape_each_segment() {
		assert_eq!(
			collection_url("http://store:8108", "legacy_records"),
			"http://store:8108/collections/legacy_records"
		);
		assert_eq!(
			collection_url("http://store:8108", "a b/ç"),
			"http://store:8108/collections/a%20b%2F%C3%A7"
		);
		assert_eq!(
			document_url("http://store:8108", "records", "12/ação 3"),
			"http://store:8108/collections/records/documents/12%2Fa%C3%A7%C3%A3o%203"
		);
	}
}
