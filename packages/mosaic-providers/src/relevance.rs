use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Fetches the externally maintained relevance score of a document title.
pub async fn score_by_title(
	cfg: &mosaic_config::RelevanceProviderConfig,
	title: &str,
) -> Result<i64> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.query(&[("title", title)])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_relevance_response(&json)
}

fn parse_relevance_response(json: &Value) -> Result<i64> {
	let score = json.get("score").or_else(|| json.get("relevance")).ok_or_else(|| {
		Error::InvalidResponse { message: "Relevance response is missing score.".to_string() }
	})?;

	score
		.as_i64()
		.or_else(|| {
			score.as_f64().filter(|value| value.is_finite()).map(|value| value.round() as i64)
		})
		.ok_or_else(|| Error::InvalidResponse {
			message: "Relevance score must be numeric.".to_string(),
		})
}
