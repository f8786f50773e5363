use clap::{CommandFactory, Parser};

use mosaic_query::{Args, Command};

#[test]
fn command_definition_is_consistent() {
	Args::command().debug_assert();
}

#[test]
fn search_collects_repeated_collections_and_defaults_paging() {
	let args = Args::try_parse_from([
		"mosaic-query",
		"--config",
		"mosaic.toml",
		"search",
		"-C",
		"records",
		"--collection",
		"legacy_records",
		"-q",
		"casa de taipa",
	])
	.expect("Parse failed.");
	let Command::Search(search) = args.command else {
		panic!("Expected the search subcommand.");
	};

	assert_eq!(search.collections.collections, vec!["records", "legacy_records"]);
	assert_eq!(search.query, "casa de taipa");
	assert_eq!(search.paging.page, 1);
	assert_eq!(search.paging.per_page, 10);
	assert!(!args.pretty);
}

#[test]
fn relevance_requires_a_collection() {
	assert!(Args::try_parse_from(["mosaic-query", "-c", "mosaic.toml", "relevance"]).is_err());
}

#[test]
fn ensure_schema_defaults_to_every_collection() {
	let args = Args::try_parse_from(["mosaic-query", "-c", "mosaic.toml", "ensure-schema"])
		.expect("Parse failed.");

	let Command::EnsureSchema(ensure) = args.command else {
		panic!("Expected the ensure-schema subcommand.");
	};

	assert_eq!(ensure.collection, None);
}
