//! Timestamps serialize as RFC 3339 and deserialize from either RFC 3339 text or the unix
//! seconds the document store keeps in `int64` fields.

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
	Unix(i64),
	Text(String),
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	match RawTimestamp::deserialize(deserializer)? {
		RawTimestamp::Unix(seconds) =>
			OffsetDateTime::from_unix_timestamp(seconds).map_err(serde::de::Error::custom),
		RawTimestamp::Text(raw) =>
			OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom),
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;
	use time::OffsetDateTime;

	#[derive(Deserialize)]
	struct Stamp {
		#[serde(with = "crate::time_serde")]
		at: OffsetDateTime,
	}

	#[test]
	fn accepts_unix_seconds_and_rfc3339() {
		let unix: Stamp =
			serde_json::from_value(serde_json::json!({ "at": 1_700_000_000 })).expect("unix");
		let text: Stamp =
			serde_json::from_value(serde_json::json!({ "at": "2023-11-14T22:13:20Z" }))
				.expect("rfc3339");

		assert_eq!(unix.at, text.at);
	}
}
