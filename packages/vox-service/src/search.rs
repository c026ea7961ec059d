use serde::{Deserialize, Serialize};

use vox_domain::brand;

use crate::{
	Result, VoxService,
	cascade::{self, CascadeInput, CascadeOutcome},
	disambiguation::{self, Resolution, SearchResponse, Step},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	/// Overrides any brand detected in the query.
	#[serde(default)]
	pub brand: Option<String>,
}

impl VoxService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			tracing::debug!("Empty query. Prompting for one.");

			return Ok(disambiguation::empty_query());
		}

		let explicit_brand = req.brand.as_deref().map(str::trim).filter(|brand| !brand.is_empty());
		let (brand, core) = match explicit_brand {
			Some(explicit) => (Some(explicit.to_string()), brand::strip_brand(query, explicit)?),
			None => match self.analyzer.brands.extract(query) {
				Some(found) => (Some(found.brand), found.core),
				None => (None, query.to_string()),
			},
		};
		let core = if core.is_empty() { query.to_string() } else { core };
		let entry = if brand.is_some() { Step::SearchWithBrand } else { Step::Initial };

		tracing::debug!(brand = brand.as_deref(), core = %core, "Query analyzed.");

		let keywords = self.analyzer.keywords.extract(&core);
		let outcome = if keywords.is_empty() {
			tracing::info!(query = %query, "Query has no usable keywords.");

			CascadeOutcome::default()
		} else {
			let variants = self.analyzer.normalizer.normalize(&core)?.into_vec();

			cascade::run(
				self.store.as_ref(),
				CascadeInput {
					keywords: &keywords,
					brand: brand.as_deref(),
					variants: &variants,
					fuzzy: &self.cfg.search.fuzzy,
				},
			)
			.await?
		};

		Ok(disambiguation::resolve(
			Resolution {
				entry,
				original_query: query,
				brand: brand.as_deref(),
				active_filter: None,
				results: outcome.results,
				tier: outcome.tier,
				max_direct_results: self.cfg.search.max_direct_results,
				recommendation_count: self.cfg.search.recommendations.count,
				sample_mode: self.sample_mode(),
			},
			&self.analyzer.materials,
		))
	}
}
