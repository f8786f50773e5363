use serde::Serialize;

pub const VECTOR_FIELD: &str = "embedding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
	#[serde(rename = "string")]
	String,
	#[serde(rename = "string[]")]
	StringArray,
	#[serde(rename = "int32")]
	Int32,
	#[serde(rename = "int64")]
	Int64,
	#[serde(rename = "float[]")]
	FloatArray,
	#[serde(rename = "bool")]
	Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
	pub name: String,
	#[serde(rename = "type")]
	pub field_type: FieldType,
	pub facet: bool,
	pub optional: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub num_dim: Option<u32>,
}
impl FieldSpec {
	fn new(name: &str, field_type: FieldType) -> Self {
		Self { name: name.to_string(), field_type, facet: false, optional: false, num_dim: None }
	}

	fn facet(mut self) -> Self {
		self.facet = true;

		self
	}

	fn optional(mut self) -> Self {
		self.optional = true;

		self
	}

	fn vector(dim: u32) -> Self {
		Self { num_dim: Some(dim), ..Self::new(VECTOR_FIELD, FieldType::FloatArray).optional() }
	}
}

/// Field layout of a collection. Never altered after the collection is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSchema {
	pub name: String,
	pub fields: Vec<FieldSpec>,
	pub default_sorting_field: String,
}
impl CollectionSchema {
	pub fn vector_field(&self) -> Option<&FieldSpec> {
		self.fields.iter().find(|field| field.num_dim.is_some())
	}
}

/// The configurable parts of every declared schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaLayout<'a> {
	pub vector_dim: u32,
	pub title_field: &'a str,
	pub category_field: &'a str,
}
impl<'a> SchemaLayout<'a> {
	pub fn from_config(cfg: &'a mosaic_config::Config) -> Self {
		Self {
			vector_dim: cfg.store.vector_dim,
			title_field: &cfg.categories.title_field,
			category_field: &cfg.categories.field,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
	Records,
	Versions,
	Overlay,
	Aggregated,
}
impl CollectionKind {
	pub const ALL: [Self; 4] = [Self::Records, Self::Versions, Self::Overlay, Self::Aggregated];

	pub fn configured_name(self, collections: &mosaic_config::Collections) -> &str {
		match self {
			Self::Records => collections.records.as_str(),
			Self::Versions => collections.versions.as_str(),
			Self::Overlay => collections.overlay.as_str(),
			Self::Aggregated => collections.aggregated.as_str(),
		}
	}

	pub fn schema(self, name: &str, layout: &SchemaLayout<'_>) -> CollectionSchema {
		use FieldType::{Bool, Int32, Int64, String as Text, StringArray};

		let SchemaLayout { vector_dim, title_field, category_field } = *layout;

		let (fields, default_sorting_field) = match self {
			Self::Records => (
				vec![
					FieldSpec::new(title_field, Text),
					FieldSpec::new("summary", Text).optional(),
					FieldSpec::new("body", Text),
					FieldSpec::new("slug", Text).optional(),
					FieldSpec::new(category_field, Text).facet(),
					FieldSpec::new("status", Text).facet(),
					FieldSpec::new("tags", StringArray).facet().optional(),
					FieldSpec::new("created_at", Int64),
					FieldSpec::new("updated_at", Int64),
					FieldSpec::vector(vector_dim),
				],
				"updated_at",
			),
			Self::Versions => (
				vec![
					FieldSpec::new("record_id", Text).facet(),
					FieldSpec::new("version", Int32),
					FieldSpec::new(title_field, Text),
					FieldSpec::new("body", Text),
					FieldSpec::new("changed_by", Text).facet().optional(),
					FieldSpec::new("changed_at", Int64),
					FieldSpec::vector(vector_dim),
				],
				"changed_at",
			),
			Self::Overlay => (
				vec![
					FieldSpec::new("legacy_collection", Text).facet(),
					FieldSpec::new("legacy_id", Text).facet(),
					FieldSpec::new("replacement_id", Text),
					FieldSpec::new("created_at", Int64),
					FieldSpec::new("created_by", Text),
					FieldSpec::new("notes", Text).optional(),
					FieldSpec::vector(vector_dim),
				],
				"created_at",
			),
			Self::Aggregated => (
				vec![
					FieldSpec::new(title_field, Text),
					FieldSpec::new("body", Text),
					FieldSpec::new("source", Text).facet(),
					FieldSpec::new("source_id", Text),
					FieldSpec::new(category_field, Text).facet().optional(),
					FieldSpec::new("status", Text).facet().optional(),
					FieldSpec::new("featured", Bool).optional(),
					FieldSpec::new("updated_at", Int64),
					FieldSpec::vector(vector_dim),
				],
				"updated_at",
			),
		};

		CollectionSchema {
			name: name.to_string(),
			fields,
			default_sorting_field: default_sorting_field.to_string(),
		}
	}
}

/// Schema declared for `name`, or `None` when `name` is not one of the configured collections.
pub fn declared_schema(
	collections: &mosaic_config::Collections,
	name: &str,
	layout: &SchemaLayout<'_>,
) -> Option<CollectionSchema> {
	CollectionKind::ALL
		.into_iter()
		.find(|kind| kind.configured_name(collections) == name)
		.map(|kind| kind.schema(name, layout))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn collections() -> mosaic_config::Collections {
		mosaic_config::Collections {
			records: "records".to_string(),
			versions: "record_versions".to_string(),
			overlay: "decommissioned".to_string(),
			aggregated: "aggregated".to_string(),
			legacy: vec!["legacy_records".to_string()],
		}
	}

	fn layout(vector_dim: u32) -> SchemaLayout<'static> {
		SchemaLayout { vector_dim, title_field: "title", category_field: "category" }
	}

	#[test]
	fn every_declared_schema_has_one_vector_and_a_sort_field() {
		for kind in CollectionKind::ALL {
			let schema = kind.schema("c", &layout(768));
			let vectors: Vec<_> = schema.fields.iter().filter(|f| f.num_dim.is_some()).collect();

			assert_eq!(vectors.len(), 1, "{kind:?}");
			assert_eq!(vectors[0].num_dim, Some(768));
			assert!(
				schema.fields.iter().any(|f| f.name == schema.default_sorting_field
					&& matches!(f.field_type, FieldType::Int32 | FieldType::Int64)
					&& !f.optional),
				"{kind:?} default sort field must be a required numeric field"
			);
		}
	}

	#[test]
	fn declared_schema_resolves_by_configured_name() {
		let collections = collections();
		let schema =
			declared_schema(&collections, "decommissioned", &layout(8)).expect("overlay schema");

		assert_eq!(schema.name, "decommissioned");
		assert!(schema.fields.iter().any(|f| f.name == "replacement_id"));
		assert!(declared_schema(&collections, "legacy_records", &layout(8)).is_none());
	}

	#[test]
	fn schema_serializes_in_store_vocabulary() {
		let schema = CollectionKind::Records.schema("records", &layout(4));
		let json = serde_json::to_value(&schema).expect("serialize");
		let vector = json["fields"]
			.as_array()
			.and_then(|fields| fields.iter().find(|f| f["name"] == VECTOR_FIELD))
			.expect("vector field");

		assert_eq!(json["default_sorting_field"], "updated_at");
		assert_eq!(vector["type"], "float[]");
		assert_eq!(vector["num_dim"], 4);
		assert!(json["fields"][0].get("num_dim").is_none());
	}

	#[test]
	fn title_and_category_fields_follow_the_layout() {
		let layout = SchemaLayout { vector_dim: 4, title_field: "nome", category_field: "tema" };

		for kind in [CollectionKind::Records, CollectionKind::Aggregated] {
			let schema = kind.schema("c", &layout);
			let tema = schema.fields.iter().find(|f| f.name == "tema").expect("category field");

			assert!(tema.facet, "{kind:?}");
			assert!(schema.fields.iter().any(|f| f.name == "nome"), "{kind:?}");
			assert!(!schema.fields.iter().any(|f| f.name == "category" || f.name == "title"));
		}
	}
}
