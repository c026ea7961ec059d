use serde::{Deserialize, Serialize};

use vox_domain::{
	Product, ScoredProduct, facets::FacetKind, predicate::contains_ignore_case,
};

use crate::{
	Error, Result, VoxService,
	disambiguation::{self, ActiveFilter, DisambiguationState, Resolution, SearchResponse, Step},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterRequest {
	pub state: DisambiguationState,
	/// Candidates returned by the previous turn.
	pub results: Vec<ScoredProduct>,
	#[serde(rename = "type")]
	pub filter_type: FacetKind,
	pub value: String,
}

impl VoxService {
	/// Narrows the previous turn's candidates without another catalog query.
	pub fn apply_filter(&self, req: FilterRequest) -> Result<SearchResponse> {
		let FilterRequest { state, results, filter_type, value } = req;

		if state.step != Step::NeedsFilter {
			return Err(Error::InvalidRequest {
				message: format!(
					"filters apply to needs_filter results, not {}.",
					state.step.as_str()
				),
			});
		}

		let value = value.trim();

		if value.is_empty() {
			return Err(Error::InvalidRequest { message: "filter value must be non-empty.".to_string() });
		}

		let before = results.len();
		let narrowed = results
			.into_iter()
			.filter(|item| self.filter_matches(&item.product, filter_type, value))
			.collect::<Vec<_>>();

		tracing::debug!(
			filter_type = filter_type.as_str(),
			value,
			before,
			after = narrowed.len(),
			"Filter applied."
		);

		Ok(disambiguation::resolve(
			Resolution {
				entry: Step::ApplyFilter,
				original_query: &state.original_query,
				brand: state.extracted_brand.as_deref(),
				active_filter: Some(ActiveFilter { filter_type, value: value.to_string() }),
				results: narrowed,
				tier: None,
				max_direct_results: self.cfg.search.max_direct_results,
				recommendation_count: self.cfg.search.recommendations.count,
				sample_mode: self.sample_mode(),
			},
			&self.analyzer.materials,
		))
	}

	fn filter_matches(&self, product: &Product, filter_type: FacetKind, value: &str) -> bool {
		match filter_type {
			FacetKind::Brand => contains_ignore_case(&product.brand, value),
			FacetKind::Category => contains_ignore_case(&product.category, value),
			FacetKind::SubCategory => contains_ignore_case(&product.sub_category_1, value),
			FacetKind::Material => self.analyzer.materials.has_material(product, value),
		}
	}
}
