use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = mosaic_query::Args::parse();

	mosaic_query::run(args).await
}
