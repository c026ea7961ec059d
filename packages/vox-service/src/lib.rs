pub mod cascade;
pub mod disambiguation;
pub mod filter;
pub mod search;

mod error;

pub use cascade::Tier;
pub use disambiguation::{
	ActiveFilter, DisambiguationState, ProductSummary, SearchResponse, Step,
};
pub use error::{Error, Result};
pub use filter::FilterRequest;
pub use search::SearchRequest;

use std::{future::Future, pin::Pin, sync::Arc};

use vox_config::{Config, Lexicon, SearchFuzzy};
use vox_domain::{
	Field, Predicate, Product, ScoredProduct,
	brand::BrandExtractor,
	facets::MaterialMatcher,
	keywords::KeywordExtractor,
	normalizer::{Normalizer, QueryVariant},
	sampling::SampleMode,
};
use vox_storage::{catalog, db::CatalogPool, memory::MemoryCatalog};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read side of the product catalog.
pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn find_matching<'a>(
		&'a self,
		predicate: &'a Predicate,
	) -> BoxFuture<'a, vox_storage::Result<Vec<Product>>>;

	fn text_search<'a>(
		&'a self,
		variants: &'a [QueryVariant],
		fields: &'a [Field],
		fuzzy: &'a SearchFuzzy,
	) -> BoxFuture<'a, vox_storage::Result<Vec<ScoredProduct>>>;
}

pub struct PgCatalogStore {
	pool: Arc<CatalogPool>,
}
impl PgCatalogStore {
	pub fn new(pool: Arc<CatalogPool>) -> Self {
		Self { pool }
	}
}
impl CatalogStore for PgCatalogStore {
	fn find_matching<'a>(
		&'a self,
		predicate: &'a Predicate,
	) -> BoxFuture<'a, vox_storage::Result<Vec<Product>>> {
		Box::pin(async move {
			let pool = self.pool.acquire().await?;

			catalog::find_matching(&pool, predicate).await
		})
	}

	fn text_search<'a>(
		&'a self,
		variants: &'a [QueryVariant],
		fields: &'a [Field],
		fuzzy: &'a SearchFuzzy,
	) -> BoxFuture<'a, vox_storage::Result<Vec<ScoredProduct>>> {
		Box::pin(async move {
			let pool = self.pool.acquire().await?;

			catalog::text_search(&pool, variants, fields, fuzzy).await
		})
	}
}

impl CatalogStore for MemoryCatalog {
	fn find_matching<'a>(
		&'a self,
		predicate: &'a Predicate,
	) -> BoxFuture<'a, vox_storage::Result<Vec<Product>>> {
		Box::pin(async move { Ok(MemoryCatalog::find_matching(self, predicate)) })
	}

	fn text_search<'a>(
		&'a self,
		variants: &'a [QueryVariant],
		fields: &'a [Field],
		fuzzy: &'a SearchFuzzy,
	) -> BoxFuture<'a, vox_storage::Result<Vec<ScoredProduct>>> {
		Box::pin(async move { Ok(MemoryCatalog::text_search(self, variants, fields, fuzzy)) })
	}
}

/// Lexicon-driven query analysis, compiled once per service.
pub struct Analyzer {
	pub normalizer: Normalizer,
	pub brands: BrandExtractor,
	pub keywords: KeywordExtractor,
	pub materials: MaterialMatcher,
}
impl Analyzer {
	pub fn new(lexicon: &Lexicon, min_keyword_chars: usize) -> Result<Self> {
		Ok(Self {
			normalizer: Normalizer::new(lexicon)?,
			brands: BrandExtractor::new(&lexicon.brands)?,
			keywords: KeywordExtractor::new(lexicon, min_keyword_chars)?,
			materials: MaterialMatcher::new(lexicon)?,
		})
	}
}

pub struct VoxService {
	pub cfg: Config,
	pub analyzer: Analyzer,
	pub store: Arc<dyn CatalogStore>,
}
impl VoxService {
	pub fn new(cfg: Config, lexicon: &Lexicon, store: Arc<dyn CatalogStore>) -> Result<Self> {
		let analyzer = Analyzer::new(lexicon, cfg.search.min_keyword_chars)?;

		Ok(Self { cfg, analyzer, store })
	}

	pub(crate) fn sample_mode(&self) -> SampleMode {
		let recommendations = &self.cfg.search.recommendations;

		match recommendations.mode.as_str() {
			"random" => SampleMode::Random { seed: recommendations.seed },
			_ => SampleMode::First,
		}
	}
}
