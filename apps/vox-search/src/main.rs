use clap::Parser;

use vox_search::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	vox_search::run(args).await
}
