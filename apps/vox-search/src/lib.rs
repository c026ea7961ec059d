use std::{fs, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use vox_config::Config;
use vox_domain::{Product, facets::FacetKind};
use vox_service::{
	CatalogStore, FilterRequest, PgCatalogStore, SearchRequest, SearchResponse, VoxService,
};
use vox_storage::{catalog, db::CatalogPool, memory::MemoryCatalog, schema};

#[derive(Debug, Parser)]
#[command(
	version = vox_cli::VERSION,
	rename_all = "kebab",
	styles = vox_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Runs one search turn and prints the response.
	Search {
		#[arg(required = true, value_name = "QUERY")]
		query: Vec<String>,
		/// Brand to filter by instead of the one detected in the query.
		#[arg(long, short = 'b')]
		brand: Option<String>,
	},
	/// Narrows a previous `needs_filter` response.
	Filter {
		/// Response printed by an earlier `search` or `filter`.
		#[arg(long, short = 'r', value_name = "FILE")]
		response: PathBuf,
		#[arg(long = "type", short = 't', value_parser = parse_facet)]
		filter_type: FacetKind,
		#[arg(long, short = 'v')]
		value: String,
	},
	/// Loads a JSON array of products into Postgres.
	Import {
		#[arg(long, short = 'f', value_name = "FILE")]
		file: PathBuf,
		/// Drops the existing products first.
		#[arg(long)]
		replace: bool,
	},
	/// Prints catalog completeness counters.
	Stats,
	/// Prints the schema SQL.
	Schema,
}

#[derive(Debug)]
pub enum Output {
	Json(Value),
	Text(String),
}

enum Backend {
	Postgres(Arc<CatalogPool>),
	Memory(Arc<MemoryCatalog>),
}
impl Backend {
	fn open(config: &Config) -> color_eyre::Result<Self> {
		match config.catalog.backend.as_str() {
			"postgres" => {
				let postgres = config.storage.postgres.as_ref().ok_or_else(|| {
					eyre::eyre!("storage.postgres is required when catalog.backend is postgres.")
				})?;

				Ok(Self::Postgres(Arc::new(CatalogPool::new(postgres))))
			},
			"json" => {
				let path = config.catalog.json_path.as_ref().ok_or_else(|| {
					eyre::eyre!("catalog.json_path is required when catalog.backend is json.")
				})?;

				Ok(Self::Memory(Arc::new(MemoryCatalog::from_json_file(path)?)))
			},
			other => Err(eyre::eyre!("Unsupported catalog backend {other:?}.")),
		}
	}

	fn store(&self) -> Arc<dyn CatalogStore> {
		match self {
			Self::Postgres(pool) => Arc::new(PgCatalogStore::new(pool.clone())),
			Self::Memory(catalog) => catalog.clone(),
		}
	}

	async fn close(&self) {
		if let Self::Postgres(pool) = self {
			pool.close().await;
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = vox_config::load(&args.config)?;

	init_tracing(&config)?;

	match execute(config, args.command).await? {
		Output::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
		Output::Text(text) => println!("{text}"),
	}

	Ok(())
}

/// Runs `command` against the configured catalog.
pub async fn execute(config: Config, command: Command) -> color_eyre::Result<Output> {
	if let Command::Schema = command {
		return Ok(Output::Text(schema::render_schema()));
	}

	let backend = Backend::open(&config)?;
	let result = execute_with(&backend, config, command).await;

	backend.close().await;

	result
}

async fn execute_with(
	backend: &Backend,
	config: Config,
	command: Command,
) -> color_eyre::Result<Output> {
	match command {
		Command::Search { query, brand } => {
			let service = build_service(backend, config)?;
			let response =
				service.search(SearchRequest { query: query.join(" "), brand }).await?;

			Ok(Output::Json(serde_json::to_value(response)?))
		},
		Command::Filter { response, filter_type, value } => {
			let raw = fs::read_to_string(&response)?;
			let prior: SearchResponse = serde_json::from_str(&raw)?;
			let service = build_service(backend, config)?;
			let narrowed = service.apply_filter(FilterRequest {
				state: prior.state,
				results: prior.results,
				filter_type,
				value,
			})?;

			Ok(Output::Json(serde_json::to_value(narrowed)?))
		},
		Command::Import { file, replace } => {
			let Backend::Postgres(pool) = backend else {
				return Err(eyre::eyre!("import requires catalog.backend to be postgres."));
			};
			let raw = fs::read_to_string(&file)?;
			let products: Vec<Product> = serde_json::from_str(&raw)?;

			pool.ensure_schema().await?;

			let report = catalog::import_products(&pool.acquire().await?, products, replace).await?;

			tracing::info!(
				imported = report.imported,
				rejected = report.rejected,
				skipped_existing = report.skipped_existing,
				"Import finished."
			);

			Ok(Output::Json(serde_json::to_value(report)?))
		},
		Command::Stats => {
			let stats = match backend {
				Backend::Postgres(pool) => catalog::stats(&pool.acquire().await?).await?,
				Backend::Memory(catalog) => catalog.stats(),
			};

			Ok(Output::Json(serde_json::to_value(stats)?))
		},
		Command::Schema => Ok(Output::Text(schema::render_schema())),
	}
}

fn build_service(backend: &Backend, config: Config) -> color_eyre::Result<VoxService> {
	let lexicon = vox_config::resolve_lexicon(&config)?;

	Ok(VoxService::new(config, &lexicon, backend.store())?)
}

fn parse_facet(raw: &str) -> Result<FacetKind, String> {
	match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
		"brand" => Ok(FacetKind::Brand),
		"category" => Ok(FacetKind::Category),
		"sub_category" => Ok(FacetKind::SubCategory),
		"material" => Ok(FacetKind::Material),
		_ => Err(format!(
			"unknown filter type {raw:?}, expected one of brand, category, sub_category, material"
		)),
	}
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

	Ok(())
}
