//! Turns a candidate set into a conversational answer.
//!
//! ```text
//! initial ──search──▶ final | no_results | needs_filter
//! initial ──search_with_brand──▶ final | no_results | needs_filter
//! needs_filter ──apply_filter──▶ final | no_results | needs_filter
//! ```
//!
//! The state is echoed back by the caller on every turn and never stored.

use serde::{Deserialize, Serialize};

use vox_domain::{
	Product, ScoredProduct,
	facets::{FacetKind, Facets, MaterialMatcher},
	sampling::{self, SampleMode},
};

use crate::cascade::Tier;

pub const EMPTY_QUERY_SPEECH: &str =
	"I didn't receive a search query. Please tell me what you're looking for.";

pub const RETRY_SUGGESTIONS: [&str; 4] = [
	"Try a more general term, for example the product type without its size.",
	"Check the spelling of the product or brand name.",
	"Try a different brand, or search without a brand.",
	"Try a synonym or the French name of the product.",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
	Initial,
	SearchWithBrand,
	ApplyFilter,
	Final,
	NoResults,
	NeedsFilter,
}
impl Step {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Initial => "initial",
			Self::SearchWithBrand => "search_with_brand",
			Self::ApplyFilter => "apply_filter",
			Self::Final => "final",
			Self::NoResults => "no_results",
			Self::NeedsFilter => "needs_filter",
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Final | Self::NoResults)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilter {
	#[serde(rename = "type")]
	pub filter_type: FacetKind,
	pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationState {
	pub original_query: String,
	pub extracted_brand: Option<String>,
	pub active_filter: Option<ActiveFilter>,
	pub step: Step,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
	pub reference: String,
	pub brand: String,
	pub designation: String,
}
impl From<&Product> for ProductSummary {
	fn from(product: &Product) -> Self {
		Self {
			reference: product.reference.clone(),
			brand: product.brand.clone(),
			designation: product.designation.clone(),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
	/// Transition that produced this response.
	pub entry: Step,
	pub step: Step,
	pub state: DisambiguationState,
	pub result_count: usize,
	/// Every candidate. Echo these back with the state when applying a filter.
	pub results: Vec<ScoredProduct>,
	/// Set on `final`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub summaries: Vec<ProductSummary>,
	/// Set on `needs_filter`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facets: Option<Facets>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suggested_filter: Option<FacetKind>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub recommendations: Vec<ProductSummary>,
	/// Set on `no_results`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub suggestions: Vec<String>,
	pub speech: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tier: Option<Tier>,
}

pub(crate) struct Resolution<'a> {
	pub entry: Step,
	pub original_query: &'a str,
	pub brand: Option<&'a str>,
	pub active_filter: Option<ActiveFilter>,
	pub results: Vec<ScoredProduct>,
	pub tier: Option<Tier>,
	pub max_direct_results: usize,
	pub recommendation_count: usize,
	pub sample_mode: SampleMode,
}

pub(crate) fn empty_query() -> SearchResponse {
	SearchResponse {
		entry: Step::Initial,
		step: Step::Initial,
		state: DisambiguationState {
			original_query: String::new(),
			extracted_brand: None,
			active_filter: None,
			step: Step::Initial,
		},
		result_count: 0,
		results: Vec::new(),
		summaries: Vec::new(),
		facets: None,
		suggested_filter: None,
		recommendations: Vec::new(),
		suggestions: Vec::new(),
		speech: EMPTY_QUERY_SPEECH.to_string(),
		tier: None,
	}
}

/// Applies the count rule: none, a direct answer, or a request for a facet.
pub(crate) fn resolve(args: Resolution<'_>, materials: &MaterialMatcher) -> SearchResponse {
	let Resolution {
		entry,
		original_query,
		brand,
		active_filter,
		results,
		tier,
		max_direct_results,
		recommendation_count,
		sample_mode,
	} = args;
	let count = results.len();
	let step = match count {
		0 => Step::NoResults,
		n if n <= max_direct_results => Step::Final,
		_ => Step::NeedsFilter,
	};
	let state = DisambiguationState {
		original_query: original_query.to_string(),
		extracted_brand: brand.map(str::to_string),
		active_filter,
		step,
	};
	let mut response = SearchResponse {
		entry,
		step,
		state,
		result_count: count,
		results: Vec::new(),
		summaries: Vec::new(),
		facets: None,
		suggested_filter: None,
		recommendations: Vec::new(),
		suggestions: Vec::new(),
		speech: String::new(),
		tier,
	};

	match step {
		Step::NoResults => {
			response.suggestions = RETRY_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
			response.speech = no_results_speech(&response.state);
		},
		Step::Final => {
			response.summaries =
				results.iter().map(|item| ProductSummary::from(&item.product)).collect();
			response.speech = final_speech(&response.summaries);
		},
		_ => {
			let products = results.iter().map(|item| item.product.clone()).collect::<Vec<_>>();
			let facets = Facets::build(&products, materials);
			let suggested = facets.suggest(brand.is_some());

			response.recommendations = sampling::pick(&products, recommendation_count, sample_mode)
				.into_iter()
				.map(ProductSummary::from)
				.collect();
			response.speech = needs_filter_speech(count, &response.state, &facets, suggested);
			response.suggested_filter = suggested;
			response.facets = Some(facets);
		},
	}

	tracing::info!(
		entry = entry.as_str(),
		step = step.as_str(),
		count,
		tier = tier.map(Tier::as_str),
		"Search turn resolved."
	);

	response.results = results;

	response
}

fn describe_query(state: &DisambiguationState) -> String {
	let mut out = state.original_query.clone();

	if let Some(filter) = state.active_filter.as_ref() {
		out.push_str(&format!(" with {} {}", facet_label(filter.filter_type), filter.value));
	}

	out
}

fn final_speech(summaries: &[ProductSummary]) -> String {
	let names = summaries
		.iter()
		.map(|summary| {
			if summary.designation.is_empty() {
				summary.reference.as_str()
			} else {
				summary.designation.as_str()
			}
		})
		.collect::<Vec<_>>()
		.join(", ");
	let plural = if summaries.len() == 1 { "" } else { "s" };

	format!("I found {} product{plural}: {names}.", summaries.len())
}

fn no_results_speech(state: &DisambiguationState) -> String {
	format!(
		"I couldn't find any products matching \"{}\". Please try a different search term.",
		describe_query(state)
	)
}

fn needs_filter_speech(
	count: usize,
	state: &DisambiguationState,
	facets: &Facets,
	suggested: Option<FacetKind>,
) -> String {
	let lead = format!("I found {count} products matching \"{}\".", describe_query(state));

	let Some(kind) = suggested else {
		return format!("{lead} Could you be more specific?");
	};
	let examples =
		facets.get(kind).iter().take(3).map(|entry| entry.value.as_str()).collect::<Vec<_>>();

	format!(
		"{lead} Which {} are you interested in? For example: {}.",
		facet_label(kind),
		examples.join(", ")
	)
}

fn facet_label(kind: FacetKind) -> &'static str {
	match kind {
		FacetKind::Brand => "brand",
		FacetKind::Category => "category",
		FacetKind::SubCategory => "sub-category",
		FacetKind::Material => "material",
	}
}

#[cfg(test)]
mod tests {
	use super::{DisambiguationState, ProductSummary, Step, final_speech, no_results_speech};

	fn summary(designation: &str) -> ProductSummary {
		ProductSummary {
			reference: "R".to_string(),
			brand: "B".to_string(),
			designation: designation.to_string(),
		}
	}

	#[test]
	fn final_speech_pluralizes() {
		assert_eq!(final_speech(&[summary("Tube verre")]), "I found 1 product: Tube verre.");
		assert_eq!(
			final_speech(&[summary("Tube verre"), summary("")]),
			"I found 2 products: Tube verre, R."
		);
	}

	#[test]
	fn no_results_speech_quotes_the_query() {
		let state = DisambiguationState {
			original_query: "glass tubes".to_string(),
			extracted_brand: None,
			active_filter: None,
			step: Step::NoResults,
		};

		assert_eq!(
			no_results_speech(&state),
			"I couldn't find any products matching \"glass tubes\". Please try a different search term."
		);
	}

	#[test]
	fn steps_serialize_as_snake_case() {
		assert_eq!(
			serde_json::to_string(&Step::NeedsFilter).expect("Failed to serialize step."),
			"\"needs_filter\""
		);
		assert!(Step::Final.is_terminal());
		assert!(!Step::NeedsFilter.is_terminal());
	}
}
