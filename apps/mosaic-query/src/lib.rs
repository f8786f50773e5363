use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time;
use tracing_subscriber::EnvFilter;

use mosaic_service::{CategorySearchRequest, MosaicService, SearchRequest};

#[derive(Debug, Parser)]
#[command(
	version = mosaic_cli::VERSION,
	rename_all = "kebab",
	styles = mosaic_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Pretty-print the JSON result.
	#[arg(long)]
	pub pretty: bool,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Hybrid search across collections, merged and re-paged.
	Search(SearchArgs),
	/// Every document of one category, ordered by relevance.
	Category(CategoryArgs),
	/// One document by id, following a decommissioning redirect.
	Get(GetArgs),
	/// Aggregate relevance per category.
	Relevance(CollectionsArg),
	/// Create missing collections from their declared schemas.
	EnsureSchema(EnsureSchemaArgs),
}

#[derive(Debug, ClapArgs)]
pub struct CollectionsArg {
	#[arg(long = "collection", short = 'C', value_name = "NAME", required = true)]
	pub collections: Vec<String>,
}

#[derive(Debug, ClapArgs)]
pub struct PagingArgs {
	#[arg(long, value_name = "N", default_value_t = 1)]
	pub page: u32,
	#[arg(long, value_name = "N", default_value_t = 10)]
	pub per_page: u32,
}

#[derive(Debug, ClapArgs)]
pub struct SearchArgs {
	#[command(flatten)]
	pub collections: CollectionsArg,
	#[arg(long, short = 'q', value_name = "TEXT", default_value = "")]
	pub query: String,
	#[command(flatten)]
	pub paging: PagingArgs,
}

#[derive(Debug, ClapArgs)]
pub struct CategoryArgs {
	#[command(flatten)]
	pub collections: CollectionsArg,
	#[arg(long, value_name = "NAME")]
	pub category: String,
	#[command(flatten)]
	pub paging: PagingArgs,
}

#[derive(Debug, ClapArgs)]
pub struct GetArgs {
	#[arg(long, value_name = "NAME")]
	pub collection: String,
	#[arg(long, value_name = "ID")]
	pub id: String,
}

#[derive(Debug, ClapArgs)]
pub struct EnsureSchemaArgs {
	/// Only ensure this collection. All declared collections otherwise.
	#[arg(long, value_name = "NAME")]
	pub collection: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = mosaic_config::load(&args.config)?;

	init_tracing(&config)?;

	tracing::debug!(config = %args.config.display(), "Configuration loaded.");

	let deadline = Duration::from_millis(config.service.request_timeout_ms);
	let service = MosaicService::new(config)?;
	let output = time::timeout(deadline, execute(&service, args.command))
		.await
		.map_err(|_| eyre::eyre!("Operation timed out after {} ms.", deadline.as_millis()))??;
	let rendered = if args.pretty {
		serde_json::to_string_pretty(&output)?
	} else {
		serde_json::to_string(&output)?
	};

	println!("{rendered}");

	Ok(())
}

pub async fn execute(service: &MosaicService, command: Command) -> color_eyre::Result<Value> {
	match command {
		Command::Search(args) => {
			let result = service
				.search_across_collections(SearchRequest {
					collections: args.collections.collections,
					query: args.query,
					page: args.paging.page,
					per_page: args.paging.per_page,
				})
				.await?;

			to_json(&result)
		},
		Command::Category(args) => {
			let result = service
				.search_by_category(CategorySearchRequest {
					collections: args.collections.collections,
					category: args.category,
					page: args.paging.page,
					per_page: args.paging.per_page,
				})
				.await?;

			to_json(&result)
		},
		Command::Get(args) => to_json(&service.get_by_id(&args.collection, &args.id).await?),
		Command::Relevance(args) =>
			to_json(&service.category_relevance(&args.collections).await?),
		Command::EnsureSchema(args) => {
			let outcomes = match args.collection {
				Some(name) => {
					let outcome = service.ensure_collection_exists(&name).await?;

					vec![(name, outcome)]
				},
				None => service.ensure_all_collections().await?,
			};
			let mut out = Map::new();

			for (name, outcome) in outcomes {
				out.insert(name, serde_json::to_value(outcome)?);
			}

			Ok(Value::Object(out))
		},
	}
}

fn to_json<T>(value: &T) -> color_eyre::Result<Value>
where
	T: Serialize,
{
	Ok(serde_json::to_value(value)?)
}

fn init_tracing(config: &mosaic_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to initialize tracing: {err}."))?;

	Ok(())
}
